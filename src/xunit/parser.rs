//! JUnit-style XML report parsing.
//!
//! Streams the document with quick-xml instead of building a DOM; a
//! report from a large run can hold tens of thousands of cases.
//!
//! # Accepted shape
//!
//! ```xml
//! <testsuites>
//!   <testsuite name="nosetests" tests="2">
//!     <testcase classname="tests.test_net" name="test_quotas[id-...]" time="1.5"/>
//!     <testcase classname="tests.test_net" name="test_ban[(12345)]" time="0.2">
//!       <failure message="AssertionError">traceback...</failure>
//!     </testcase>
//!   </testsuite>
//! </testsuites>
//! ```
//!
//! A bare `<testsuite>` root works as well. Elements other than
//! `testcase`, `failure`, `error` and `skipped` are ignored.

use std::path::Path;
use std::time::Duration;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use super::{CaseStatus, XunitCase, XunitError, XunitResult};

/// Parse a report file into its executed test cases.
pub fn parse_report(path: &Path) -> XunitResult<Vec<XunitCase>> {
    let content = std::fs::read_to_string(path)?;
    parse_report_str(&content)
}

/// Parse report XML from a string.
pub fn parse_report_str(content: &str) -> XunitResult<Vec<XunitCase>> {
    let mut reader = Reader::from_str(content);

    let mut cases = Vec::new();
    let mut current: Option<XunitCase> = None;
    // Set while inside a <failure>/<error>/<skipped> child, so that
    // text under system-out and friends is not captured as a message.
    let mut in_detail = false;

    loop {
        let position = reader.buffer_position() as u64;
        let event = reader.read_event().map_err(|e| XunitError::Malformed {
            position,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"testcase" => current = Some(case_from_attributes(&reader, &e)?),
                b"failure" | b"error" | b"skipped" => {
                    if let Some(case) = current.as_mut() {
                        apply_detail(case, &reader, &e)?;
                        in_detail = true;
                    }
                }
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"testcase" => cases.push(case_from_attributes(&reader, &e)?),
                b"failure" | b"error" | b"skipped" => {
                    if let Some(case) = current.as_mut() {
                        apply_detail(case, &reader, &e)?;
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"testcase" => {
                    if let Some(case) = current.take() {
                        cases.push(case);
                    }
                }
                b"failure" | b"error" | b"skipped" => in_detail = false,
                _ => {}
            },
            Event::Text(t) if in_detail => {
                if let Some(case) = current.as_mut() {
                    let text = t.unescape().map_err(|e| XunitError::Malformed {
                        position,
                        message: e.to_string(),
                    })?;
                    let text = text.trim();
                    if !text.is_empty() {
                        match &mut case.message {
                            Some(msg) => {
                                msg.push('\n');
                                msg.push_str(text);
                            }
                            None => case.message = Some(text.to_string()),
                        }
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(cases)
}

/// Build a case from `<testcase>` attributes; the status starts as
/// passed and is downgraded by child elements.
fn case_from_attributes(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> XunitResult<XunitCase> {
    let mut classname = String::new();
    let mut methodname = String::new();
    let mut duration = Duration::ZERO;
    let mut report_id = None;

    for attr in e.attributes() {
        let attr = attr.map_err(|err| XunitError::Malformed {
            position: reader.buffer_position() as u64,
            message: err.to_string(),
        })?;
        let value = attr
            .unescape_value()
            .map_err(|err| XunitError::Malformed {
                position: reader.buffer_position() as u64,
                message: err.to_string(),
            })?
            .into_owned();
        match attr.key.as_ref() {
            b"classname" => classname = value,
            b"name" => methodname = value,
            b"time" => {
                duration = value
                    .parse::<f64>()
                    .ok()
                    .filter(|t| t.is_finite() && *t >= 0.0)
                    .map(Duration::from_secs_f64)
                    .unwrap_or(Duration::ZERO);
            }
            b"id" => report_id = Some(value),
            _ => {}
        }
    }

    Ok(XunitCase {
        classname,
        methodname,
        status: CaseStatus::Passed,
        duration,
        message: None,
        report_id,
    })
}

/// Apply a `<failure>`/`<error>`/`<skipped>` child to the open case.
fn apply_detail(
    case: &mut XunitCase,
    reader: &Reader<&[u8]>,
    e: &BytesStart<'_>,
) -> XunitResult<()> {
    case.status = match e.local_name().as_ref() {
        b"failure" => CaseStatus::Failed,
        b"error" => CaseStatus::Errored,
        _ => CaseStatus::Skipped,
    };

    for attr in e.attributes() {
        let attr = attr.map_err(|err| XunitError::Malformed {
            position: reader.buffer_position() as u64,
            message: err.to_string(),
        })?;
        if attr.key.as_ref() == b"message" {
            let value = attr
                .unescape_value()
                .map_err(|err| XunitError::Malformed {
                    position: reader.buffer_position() as u64,
                    message: err.to_string(),
                })?
                .into_owned();
            case.message = Some(value);
        }
    }

    Ok(())
}
