//! End-to-end report synchronization.
//!
//! Ties the pieces together: resolve the configured TestRail entities,
//! run the matching core, reuse or create the plan for the build under
//! test, open a run holding the matched cases and upload one verdict
//! per matched test.
//!
//! Verdict mapping: passed → `passed`, failed → `failed`, errored →
//! `blocked`. Skipped tests participate in matching but never upload a
//! verdict.

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::mapping::{CaseMapper, Correspondence};
use crate::testrail::{
    Case, Client, Plan, ResultDraft, Run, Status, Suite, SuiteStore,
};
use crate::xunit::{CaseStatus, XunitCase};

/// Upper bound for uploaded result comments; longer messages keep
/// their tail (the end of a traceback is the informative part).
const MAX_COMMENT_LEN: usize = 4000;

/// Drives one full sync of a parsed report into TestRail.
pub struct Reporter<'a> {
    client: &'a Client,
    config: &'a Config,
}

/// Resolved TestRail entities plus the computed correspondence.
pub struct MatchedRun {
    /// Id of the configured project.
    pub project_id: u64,
    /// Id of the configured milestone.
    pub milestone_id: u64,
    /// The configured suite.
    pub suite: Suite,
    /// The tracker-case ↔ executed-test correspondence.
    pub correspondence: Correspondence,
}

impl<'a> Reporter<'a> {
    /// Create a reporter over the given client and configuration.
    pub fn new(client: &'a Client, config: &'a Config) -> Self {
        Self { client, config }
    }

    /// Sync the executed tests into TestRail.
    ///
    /// Returns the created run, or `None` when nothing matched (a
    /// warning, not an error) or when `dry_run` stopped before the
    /// first write.
    pub fn execute(&self, xunit_cases: &[XunitCase], dry_run: bool) -> Result<Option<Run>> {
        let matched = self.match_cases(xunit_cases, dry_run)?;

        if matched.correspondence.is_empty() {
            warn!("No cases matched, nothing to report");
            return Ok(None);
        }

        let plan_name = self.plan_name()?;
        if dry_run {
            info!(
                "[dry run] Would report {} results into plan `{}`",
                matched.correspondence.len(),
                plan_name
            );
            return Ok(None);
        }

        let plan = self.get_or_create_plan(matched.project_id, matched.milestone_id, &plan_name)?;
        let run = self.create_run(&plan, &matched.suite, &matched.correspondence)?;
        let uploaded = self.upload_results(run.id, &matched.correspondence)?;

        info!("Uploaded {uploaded} results to run {}", run.id);
        println!(
            "[TestRun URL] {}",
            console::style(self.client.run_url(run.id)).green().bold()
        );

        Ok(Some(run))
    }

    /// Resolve the configured entities and compute the correspondence
    /// without creating a plan or uploading anything. The auto-create
    /// path still runs (subject to `dry_run`).
    pub fn match_cases(&self, xunit_cases: &[XunitCase], dry_run: bool) -> Result<MatchedRun> {
        let testrail = &self.config.testrail;

        let project = self.client.project_named(&testrail.project)?;
        let milestone = self.client.milestone_named(project.id, &testrail.milestone)?;
        let suite = self.client.suite_named(project.id, &testrail.suite)?;

        let mut store = SuiteStore::fetch(self.client, project.id, suite.clone())
            .with_context(|| format!("Failed to fetch cases of suite `{}`", suite.name))?;
        let candidates: Vec<Case> = store.cases().to_vec();
        info!(
            "Matching {} executed tests against {} TestRail cases",
            xunit_cases.len(),
            candidates.len()
        );

        let mut options = self.config.matching.options();
        options.dry_run = dry_run;
        let mapper = CaseMapper::with_options(self.config.matching.matcher(), options);
        let correspondence = mapper.map(xunit_cases, &candidates, &mut store, Some(milestone.id))?;

        Ok(MatchedRun {
            project_id: project.id,
            milestone_id: milestone.id,
            suite,
            correspondence,
        })
    }

    /// The plan name to reuse or create: the configured name, else
    /// derived from the milestone and build id.
    fn plan_name(&self) -> Result<String> {
        if let Some(plan) = &self.config.testrail.plan {
            return Ok(plan.clone());
        }
        if let Some(build) = &self.config.railgun.build_id {
            return Ok(format!(
                "{} build #{}",
                self.config.testrail.milestone, build
            ));
        }
        bail!("Either `testrail.plan` or `railgun.build_id` must be configured to name the plan");
    }

    /// Find the plan by name, creating it against the milestone when
    /// absent.
    fn get_or_create_plan(
        &self,
        project_id: u64,
        milestone_id: u64,
        name: &str,
    ) -> Result<Plan> {
        if let Some(plan) = self.client.plan_named(project_id, name)? {
            debug!("Found plan \"{name}\"");
            return Ok(plan);
        }

        let plan = self.client.add_plan(
            project_id,
            name,
            self.config.railgun.build_link.as_deref(),
            Some(milestone_id),
        )?;
        debug!("Created new plan \"{name}\"");
        Ok(plan)
    }

    /// Open a run inside the plan holding exactly the matched cases.
    fn create_run(
        &self,
        plan: &Plan,
        suite: &Suite,
        correspondence: &Correspondence,
    ) -> Result<Run> {
        let railgun = &self.config.railgun;

        let name = if railgun.env_description.is_empty() {
            suite.name.clone()
        } else {
            format!("{} ({})", suite.name, railgun.env_description)
        };
        let description = run_description(&name, railgun.build_link.as_deref(), railgun.results_link.as_deref());

        let entry = self.client.add_plan_entry(
            plan.id,
            suite.id,
            &name,
            Some(&description),
            &correspondence.case_ids(),
        )?;

        entry
            .runs
            .into_iter()
            .next()
            .context("TestRail returned a plan entry without runs")
    }

    /// Upload one verdict per matched, non-skipped test.
    fn upload_results(&self, run_id: u64, correspondence: &Correspondence) -> Result<usize> {
        let statuses = self.client.statuses()?;

        let results: Vec<ResultDraft> = correspondence
            .iter()
            .filter_map(|(case, xunit_case)| result_for(case, xunit_case, &statuses))
            .collect();

        if results.is_empty() {
            warn!("All matched tests were skipped, no results to upload");
            return Ok(0);
        }

        self.client.add_results_for_cases(run_id, &results)?;
        Ok(results.len())
    }
}

/// Markdown description for the created run.
fn run_description(name: &str, build_link: Option<&str>, results_link: Option<&str>) -> String {
    let mut description = format!("Run **{name}**");
    if let Some(link) = build_link {
        description.push_str(&format!(" on [build]({link})"));
    }
    description.push('.');
    if let Some(link) = results_link {
        description.push_str(&format!(" \n[Test results]({link})"));
    }
    description
}

/// One verdict, or `None` for skipped tests and unknown statuses.
fn result_for(case: &Case, xunit_case: &XunitCase, statuses: &[Status]) -> Option<ResultDraft> {
    let status_name = match xunit_case.status {
        CaseStatus::Passed => "passed",
        CaseStatus::Failed => "failed",
        // Skipped results are not reported.
        CaseStatus::Skipped => return None,
        CaseStatus::Errored => "blocked",
    };

    let Some(status) = statuses.iter().find(|s| s.name == status_name) else {
        warn!(
            "Can't find status {status_name} for result {}",
            xunit_case.methodname
        );
        return None;
    };

    let elapsed = match xunit_case.duration.as_secs() {
        0 => None,
        secs => Some(format!("{secs}s")),
    };
    let comment = xunit_case
        .message
        .as_deref()
        .map(|m| truncate_head("", m, MAX_COMMENT_LEN));

    Some(ResultDraft {
        case_id: case.id,
        status_id: status.id,
        comment,
        elapsed,
    })
}

/// Keep the tail of `text` so that `banner + text` fits `max_len`
/// characters, marking elision with a leading `...`.
pub fn truncate_head(banner: &str, text: &str, max_len: usize) -> String {
    const MARK: &str = "...\n";

    let budget = max_len.saturating_sub(banner.chars().count());
    let text_len = text.chars().count();
    if text_len <= budget {
        return format!("{banner}{text}");
    }

    let keep = budget.saturating_sub(MARK.len());
    let tail: String = text.chars().skip(text_len - keep).collect();
    format!("{banner}{MARK}{tail}")
}
