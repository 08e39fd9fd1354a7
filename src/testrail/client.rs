//! Blocking HTTP client for the TestRail v2 API.
//!
//! Every call is a single synchronous request with basic auth; there
//! is no retry or pagination layer. Failures surface as
//! [`TestRailError`] and are fatal for the run — a half-synced report
//! is worse than a loud one.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::model::{
    Case, CaseDraft, CaseField, Milestone, Plan, PlanEntry, Project, ResultDraft, Run, Section,
    Status, Suite,
};
use super::{TestRailError, TestRailResult};

/// TestRail API client.
///
/// # Example
///
/// ```no_run
/// use railgun::testrail::Client;
///
/// let client = Client::new("https://example.testrail.net", "user", "token")?;
/// let project = client.project_named("Test Project")?;
/// # Ok::<(), railgun::testrail::TestRailError>(())
/// ```
pub struct Client {
    http: reqwest::blocking::Client,
    base_url: String,
    username: String,
    password: String,
}

impl Client {
    /// Create a client for the given TestRail instance.
    ///
    /// `password` may be an account password or an API key; TestRail
    /// accepts either through basic auth.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> TestRailResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
        })
    }

    /// The instance base URL (without a trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, method: &str) -> String {
        format!("{}/index.php?/api/v2/{}", self.base_url, method)
    }

    fn get<T: DeserializeOwned>(&self, method: &str) -> TestRailResult<T> {
        debug!("GET {method}");
        let response = self
            .http
            .get(self.url(method))
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Type", "application/json")
            .send()?;
        decode(method, response)
    }

    fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: &str,
        body: &B,
    ) -> TestRailResult<T> {
        debug!("POST {method}");
        let response = self
            .http
            .post(self.url(method))
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()?;
        decode(method, response)
    }

    /// All projects visible to the account.
    pub fn projects(&self) -> TestRailResult<Vec<Project>> {
        self.get("get_projects")
    }

    /// The project with the given name.
    pub fn project_named(&self, name: &str) -> TestRailResult<Project> {
        self.projects()?
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| TestRailError::NotFound {
                kind: "project",
                name: name.to_string(),
            })
    }

    /// Milestones of a project.
    pub fn milestones(&self, project_id: u64) -> TestRailResult<Vec<Milestone>> {
        self.get(&format!("get_milestones/{project_id}"))
    }

    /// The milestone with the given name.
    pub fn milestone_named(&self, project_id: u64, name: &str) -> TestRailResult<Milestone> {
        self.milestones(project_id)?
            .into_iter()
            .find(|m| m.name == name)
            .ok_or_else(|| TestRailError::NotFound {
                kind: "milestone",
                name: name.to_string(),
            })
    }

    /// Suites of a project.
    pub fn suites(&self, project_id: u64) -> TestRailResult<Vec<Suite>> {
        self.get(&format!("get_suites/{project_id}"))
    }

    /// The suite with the given name.
    pub fn suite_named(&self, project_id: u64, name: &str) -> TestRailResult<Suite> {
        self.suites(project_id)?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| TestRailError::NotFound {
                kind: "suite",
                name: name.to_string(),
            })
    }

    /// All cases of a suite.
    pub fn cases(&self, project_id: u64, suite_id: u64) -> TestRailResult<Vec<Case>> {
        self.get(&format!("get_cases/{project_id}&suite_id={suite_id}"))
    }

    /// Create a case under a section.
    pub fn add_case(&self, section_id: u64, draft: &CaseDraft) -> TestRailResult<Case> {
        self.post(&format!("add_case/{section_id}"), draft)
    }

    /// Sections of a suite.
    pub fn sections(&self, project_id: u64, suite_id: u64) -> TestRailResult<Vec<Section>> {
        self.get(&format!("get_sections/{project_id}&suite_id={suite_id}"))
    }

    /// Create a section in a suite.
    pub fn add_section(
        &self,
        project_id: u64,
        suite_id: u64,
        name: &str,
    ) -> TestRailResult<Section> {
        self.post(
            &format!("add_section/{project_id}"),
            &serde_json::json!({ "name": name, "suite_id": suite_id }),
        )
    }

    /// Custom case field definitions of the instance.
    pub fn case_fields(&self) -> TestRailResult<Vec<CaseField>> {
        self.get("get_case_fields")
    }

    /// Plan summaries of a project (entries are not populated here;
    /// use [`plan`](Self::plan) for the full record).
    pub fn plans(&self, project_id: u64) -> TestRailResult<Vec<Plan>> {
        self.get(&format!("get_plans/{project_id}"))
    }

    /// One plan with its entries.
    pub fn plan(&self, plan_id: u64) -> TestRailResult<Plan> {
        self.get(&format!("get_plan/{plan_id}"))
    }

    /// The plan with the given name, if any.
    pub fn plan_named(&self, project_id: u64, name: &str) -> TestRailResult<Option<Plan>> {
        match self.plans(project_id)?.into_iter().find(|p| p.name == name) {
            Some(summary) => Ok(Some(self.plan(summary.id)?)),
            None => Ok(None),
        }
    }

    /// Create a plan in a project.
    pub fn add_plan(
        &self,
        project_id: u64,
        name: &str,
        description: Option<&str>,
        milestone_id: Option<u64>,
    ) -> TestRailResult<Plan> {
        self.post(
            &format!("add_plan/{project_id}"),
            &serde_json::json!({
                "name": name,
                "description": description,
                "milestone_id": milestone_id,
            }),
        )
    }

    /// Create a run inside a plan, holding exactly the given cases.
    pub fn add_plan_entry(
        &self,
        plan_id: u64,
        suite_id: u64,
        name: &str,
        description: Option<&str>,
        case_ids: &[u64],
    ) -> TestRailResult<PlanEntry> {
        self.post(
            &format!("add_plan_entry/{plan_id}"),
            &serde_json::json!({
                "suite_id": suite_id,
                "name": name,
                "description": description,
                "include_all": false,
                "case_ids": case_ids,
                "config_ids": Vec::<u64>::new(),
            }),
        )
    }

    /// All result statuses of the instance.
    pub fn statuses(&self) -> TestRailResult<Vec<Status>> {
        self.get("get_statuses")
    }

    /// Upload one result per case to a run.
    pub fn add_results_for_cases(
        &self,
        run_id: u64,
        results: &[ResultDraft],
    ) -> TestRailResult<Vec<Value>> {
        self.post(
            &format!("add_results_for_cases/{run_id}"),
            &serde_json::json!({ "results": results }),
        )
    }

    /// Run with the given id (used to report the run URL).
    pub fn run(&self, run_id: u64) -> TestRailResult<Run> {
        self.get(&format!("get_run/{run_id}"))
    }

    /// Human-facing URL of a run on this instance.
    pub fn run_url(&self, run_id: u64) -> String {
        format!("{}/index.php?/runs/view/{}", self.base_url, run_id)
    }
}

fn decode<T: DeserializeOwned>(
    method: &str,
    response: reqwest::blocking::Response,
) -> TestRailResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(TestRailError::Api {
            method: method.to_string(),
            status: status.as_u16(),
            body,
        });
    }
    response.json().map_err(|e| TestRailError::Decode {
        method: method.to_string(),
        message: e.to_string(),
    })
}
