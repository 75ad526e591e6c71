//! Domain models: the caller's task specification and the Parsons-problem
//! document the provider is asked to produce.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// What the caller wants generated.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskSpecification {
  pub language: String,
  /// Difficulty tier -> concept name -> selected.
  #[serde(default)]
  pub concepts: BTreeMap<String, BTreeMap<String, bool>>,
  pub num_problems: NonZeroU32,
}

impl TaskSpecification {
  /// Concepts flagged `true`, as (tier, concept) pairs.
  pub fn selected_concepts(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
    self.concepts.iter().flat_map(|(tier, concepts)| {
      concepts
        .iter()
        .filter(|(_, on)| **on)
        .map(move |(name, _)| (tier.as_str(), name.as_str()))
    })
  }
}

/// Expected shape of the provider's JSON output.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsonsProblemDocument {
  pub title: String,
  pub description: String,
  pub welcome_header: String,
  pub certificate_title: String,
  pub assignment_name: String,
  pub parsons_problems: Vec<ProblemSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ProblemSpec {
  pub id: String,
  pub prompt: String,
  pub statements: Vec<StatementSpec>,
}

/// One line offered to the learner: part of the solution, or a decoy.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawStatement", into = "RawStatement")]
pub enum StatementSpec {
  Solution { text: String, order: u32, feedback_wrong: String },
  Distractor { text: String, feedback: String },
}

impl StatementSpec {
  pub fn text(&self) -> &str {
    match self {
      StatementSpec::Solution { text, .. } | StatementSpec::Distractor { text, .. } => text,
    }
  }

  pub fn is_distractor(&self) -> bool {
    matches!(self, StatementSpec::Distractor { .. })
  }
}

// Wire form. A line is a distractor iff `distractor: true`; otherwise it needs an `order`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatement {
  text: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  order: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  feedback_wrong: Option<String>,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  distractor: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  feedback: Option<String>,
}

impl TryFrom<RawStatement> for StatementSpec {
  type Error = String;

  fn try_from(raw: RawStatement) -> Result<Self, Self::Error> {
    if raw.distractor {
      return Ok(StatementSpec::Distractor { text: raw.text, feedback: raw.feedback.unwrap_or_default() });
    }
    match raw.order {
      Some(order) => Ok(StatementSpec::Solution {
        text: raw.text,
        order,
        feedback_wrong: raw.feedback_wrong.unwrap_or_default(),
      }),
      None => Err(format!("statement {:?} has neither an order nor distractor: true", raw.text)),
    }
  }
}

impl From<StatementSpec> for RawStatement {
  fn from(s: StatementSpec) -> Self {
    match s {
      StatementSpec::Solution { text, order, feedback_wrong } => RawStatement {
        text,
        order: Some(order),
        feedback_wrong: Some(feedback_wrong),
        distractor: false,
        feedback: None,
      },
      StatementSpec::Distractor { text, feedback } => RawStatement {
        text,
        order: None,
        feedback_wrong: None,
        distractor: true,
        feedback: Some(feedback),
      },
    }
  }
}

impl ProblemSpec {
  /// Solution lines sorted by `order`.
  pub fn solution(&self) -> Vec<&StatementSpec> {
    let mut lines: Vec<&StatementSpec> = self.statements.iter().filter(|s| !s.is_distractor()).collect();
    lines.sort_by_key(|s| match s {
      StatementSpec::Solution { order, .. } => *order,
      StatementSpec::Distractor { .. } => u32::MAX,
    });
    lines
  }

  /// Distractor texts minus any text that also appears in the solution.
  /// Duplicates in the provider output collapse here.
  pub fn distractor_pool(&self) -> BTreeSet<&str> {
    let solution: BTreeSet<&str> =
      self.statements.iter().filter(|s| !s.is_distractor()).map(StatementSpec::text).collect();
    self.statements
      .iter()
      .filter(|s| s.is_distractor())
      .map(StatementSpec::text)
      .filter(|t| !solution.contains(t))
      .collect()
  }
}

/// Something off about a generated document. Reported, never enforced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DocumentIssue {
  ProblemCount { expected: u32, actual: usize },
  DuplicateOrder { problem_id: String, order: u32 },
  NonContiguousOrder { problem_id: String, orders: Vec<u32> },
  NoSolution { problem_id: String },
}

impl fmt::Display for DocumentIssue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DocumentIssue::ProblemCount { expected, actual } => {
        write!(f, "expected {expected} problems, got {actual}")
      }
      DocumentIssue::DuplicateOrder { problem_id, order } => {
        write!(f, "problem {problem_id}: order {order} used more than once")
      }
      DocumentIssue::NonContiguousOrder { problem_id, orders } => {
        write!(f, "problem {problem_id}: solution orders {orders:?} are not 1..=n")
      }
      DocumentIssue::NoSolution { problem_id } => write!(f, "problem {problem_id}: no solution lines"),
    }
  }
}

impl ParsonsProblemDocument {
  /// Post-check against what was asked for. `expected` is the requested problem count, if known.
  pub fn check(&self, expected: Option<u32>) -> Vec<DocumentIssue> {
    let mut issues = Vec::new();

    if let Some(expected) = expected {
      if self.parsons_problems.len() != expected as usize {
        issues.push(DocumentIssue::ProblemCount { expected, actual: self.parsons_problems.len() });
      }
    }

    for p in &self.parsons_problems {
      let mut orders: Vec<u32> = p
        .statements
        .iter()
        .filter_map(|s| match s {
          StatementSpec::Solution { order, .. } => Some(*order),
          StatementSpec::Distractor { .. } => None,
        })
        .collect();

      if orders.is_empty() {
        issues.push(DocumentIssue::NoSolution { problem_id: p.id.clone() });
        continue;
      }

      let mut seen: HashMap<u32, usize> = HashMap::new();
      for o in &orders {
        *seen.entry(*o).or_default() += 1;
      }
      let mut dups: Vec<u32> = seen.into_iter().filter(|(_, n)| *n > 1).map(|(o, _)| o).collect();
      dups.sort_unstable();
      for order in dups {
        issues.push(DocumentIssue::DuplicateOrder { problem_id: p.id.clone(), order });
      }

      orders.sort_unstable();
      orders.dedup();
      let contiguous = orders.iter().enumerate().all(|(i, o)| *o as usize == i + 1);
      if !contiguous {
        issues.push(DocumentIssue::NonContiguousOrder { problem_id: p.id.clone(), orders });
      }
    }

    issues
  }
}
