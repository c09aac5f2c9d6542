//! In-memory backend for tests and demos
//!
//! Implements the query shapes the link client emits - insert, identity
//! read (all or by id), rebind by id, remove by id - against a plain
//! vector of links, speaking the same textual notation as the external
//! tool. Enumeration order is insertion order.

use super::{Backend, ReportFlags};
use crate::model::Link;
use crate::{Error, Result};
use parking_lot::Mutex;
use regex::Regex;

struct State {
    links: Vec<Link>,
    next_id: u64,
}

/// In-process link engine speaking the backend query protocol
pub struct MemoryBackend {
    state: Mutex<State>,
    insert_re: Regex,
    identity_re: Regex,
    read_one_re: Regex,
    update_re: Regex,
    delete_re: Regex,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend {
            state: Mutex::new(State {
                links: Vec::new(),
                next_id: 1,
            }),
            // () ((S T))
            insert_re: Regex::new(r"^\(\)\s*\(\((\d+)\s+(\d+)\)\)$").unwrap(),
            // ((($i: $s $t)) (($i: $s $t)))
            identity_re: Regex::new(
                r"^\(\(\(\$(\w+):\s+\$(\w+)\s+\$(\w+)\)\)\s+\(\(\$(\w+):\s+\$(\w+)\s+\$(\w+)\)\)\)$",
            )
            .unwrap(),
            // (((ID: $s $t)) ((ID: $s $t)))
            read_one_re: Regex::new(
                r"^\(\(\((\d+):\s+\$(\w+)\s+\$(\w+)\)\)\s+\(\((\d+):\s+\$(\w+)\s+\$(\w+)\)\)\)$",
            )
            .unwrap(),
            // (((ID: $s $t)) ((ID: S T)))
            update_re: Regex::new(
                r"^\(\(\((\d+):\s+\$(\w+)\s+\$(\w+)\)\)\s+\(\((\d+):\s+(\d+)\s+(\d+)\)\)\)$",
            )
            .unwrap(),
            // (((ID: $s $t)) ())
            delete_re: Regex::new(r"^\(\(\((\d+):\s+\$(\w+)\s+\$(\w+)\)\)\s+\(\)\)$").unwrap(),
        }
    }

    fn render(links: &[Link]) -> String {
        links
            .iter()
            .map(Link::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn parse_endpoint(text: &str) -> Result<u64> {
        text.parse()
            .map_err(|_| Error::BackendQueryFailed(format!("value out of range: {}", text)))
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn invoke(&self, query: &str, flags: ReportFlags) -> Result<String> {
        let query = query.trim();
        let report = flags.before || flags.changes || flags.after;
        let mut state = self.state.lock();

        if let Some(caps) = self.insert_re.captures(query) {
            let source = Self::parse_endpoint(&caps[1])?;
            let target = Self::parse_endpoint(&caps[2])?;

            let link = Link::new(state.next_id, source, target);
            state.next_id += 1;
            state.links.push(link);

            return Ok(if report { link.to_string() } else { String::new() });
        }

        if let Some(caps) = self.identity_re.captures(query) {
            // The rebind side must echo the match side's variables
            if caps[1] != caps[4] || caps[2] != caps[5] || caps[3] != caps[6] {
                return Err(Error::BackendQueryFailed(format!(
                    "mismatched variables in query: {}",
                    query
                )));
            }
            return Ok(if report {
                Self::render(&state.links)
            } else {
                String::new()
            });
        }

        if let Some(caps) = self.read_one_re.captures(query) {
            if caps[1] != caps[4] || caps[2] != caps[5] || caps[3] != caps[6] {
                return Err(Error::BackendQueryFailed(format!(
                    "mismatched variables in query: {}",
                    query
                )));
            }
            let id = Self::parse_endpoint(&caps[1])?;
            let matched: Vec<Link> = state.links.iter().filter(|l| l.id == id).copied().collect();
            return Ok(if report {
                Self::render(&matched)
            } else {
                String::new()
            });
        }

        if let Some(caps) = self.update_re.captures(query) {
            if caps[1] != caps[4] {
                return Err(Error::BackendQueryFailed(format!(
                    "mismatched ids in query: {}",
                    query
                )));
            }
            let id = Self::parse_endpoint(&caps[1])?;
            let source = Self::parse_endpoint(&caps[5])?;
            let target = Self::parse_endpoint(&caps[6])?;

            let mut changed = Vec::new();
            for link in state.links.iter_mut().filter(|l| l.id == id) {
                link.source = source;
                link.target = target;
                changed.push(*link);
            }
            return Ok(if report {
                Self::render(&changed)
            } else {
                String::new()
            });
        }

        if let Some(caps) = self.delete_re.captures(query) {
            let id = Self::parse_endpoint(&caps[1])?;
            state.links.retain(|l| l.id != id);
            return Ok(String::new());
        }

        Err(Error::BackendQueryFailed(format!(
            "unsupported query: {}",
            query
        )))
    }

    fn describe(&self) -> String {
        format!("memory ({} links)", self.state.lock().links.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_assigned_id() {
        let backend = MemoryBackend::new();
        let output = backend.invoke("() ((100 200))", ReportFlags::changes()).unwrap();
        assert_eq!(output, "(1: 100 200)");
    }

    #[test]
    fn test_identity_query_reports_post_state() {
        let backend = MemoryBackend::new();
        backend.invoke("() ((100 200))", ReportFlags::changes()).unwrap();
        backend.invoke("() ((300 400))", ReportFlags::changes()).unwrap();

        let output = backend
            .invoke("((($i: $s $t)) (($i: $s $t)))", ReportFlags::after())
            .unwrap();
        assert_eq!(output, "(1: 100 200)\n(2: 300 400)");
    }

    #[test]
    fn test_rebind_rewrites_one_link() {
        let backend = MemoryBackend::new();
        backend.invoke("() ((100 200))", ReportFlags::changes()).unwrap();
        backend.invoke("() ((300 400))", ReportFlags::changes()).unwrap();

        let output = backend
            .invoke("(((1: $s $t)) ((1: 100 500)))", ReportFlags::changes())
            .unwrap();
        assert_eq!(output, "(1: 100 500)");

        let all = backend
            .invoke("((($i: $s $t)) (($i: $s $t)))", ReportFlags::after())
            .unwrap();
        assert_eq!(all, "(1: 100 500)\n(2: 300 400)");
    }

    #[test]
    fn test_remove_then_read_is_empty() {
        let backend = MemoryBackend::new();
        backend.invoke("() ((100 200))", ReportFlags::changes()).unwrap();

        backend
            .invoke("(((1: $s $t)) ())", ReportFlags::changes())
            .unwrap();
        // Removing an already-absent id is still a successful, empty result
        backend
            .invoke("(((1: $s $t)) ())", ReportFlags::changes())
            .unwrap();

        let output = backend
            .invoke("(((1: $s $t)) ((1: $s $t)))", ReportFlags::after())
            .unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn test_unsupported_query_is_a_fault() {
        let backend = MemoryBackend::new();
        let err = backend.invoke("((* *)) ()", ReportFlags::changes()).unwrap_err();
        assert!(matches!(err, Error::BackendQueryFailed(_)));
    }
}
