use crate::types::TestCase;
use serde::Serialize;

/// Built-in example problems used to seed a session.
/// Names are stable and double as lookup keys.

#[derive(Debug, Clone, Serialize)]
pub struct ExampleProblem {
    pub name: &'static str,
    pub description: &'static str,
    pub source: &'static str,
    pub test_cases: Vec<TestCase>,
}

struct ProblemDef {
    name: &'static str,
    description: &'static str,
    source: &'static str,
    cases: &'static [(&'static str, &'static str)],
}

const PROBLEMS: &[ProblemDef] = &[
    ProblemDef {
        name: "Beginner: Sum of Two Numbers",
        description: "Read two integers and calculate their sum - Entry level problem for new learners",
        source: "# Read two integers and print their sum\na = int(input())\nb = int(input())\nprint(a + b)",
        cases: &[
            ("5\n3", "8"),
            ("10\n-2", "8"),
            ("0\n0", "0"),
            ("-5\n7", "2"),
            ("100\n200", "300"),
            ("15\n-15", "0"),
            ("999\n1", "1000"),
        ],
    },
    ProblemDef {
        name: "Intermediate: Even or Odd",
        description: "Determine if a given number is even or odd - Logic and conditionals practice",
        source: "# Check if a number is even or odd\nn = int(input())\nif n % 2 == 0:\n    print(\"Even\")\nelse:\n    print(\"Odd\")",
        cases: &[
            ("4", "Even"),
            ("7", "Odd"),
            ("0", "Even"),
            ("1", "Odd"),
            ("100", "Even"),
            ("999", "Odd"),
            ("-2", "Even"),
        ],
    },
    ProblemDef {
        name: "Advanced: Maximum of Three",
        description: "Find the largest among three numbers - Multiple comparisons and edge case handling",
        source: "# Find the maximum of three numbers\na = int(input())\nb = int(input())\nc = int(input())\nprint(max(a, b, c))",
        cases: &[
            ("5\n8\n3", "8"),
            ("10\n10\n10", "10"),
            ("1\n2\n3", "3"),
            ("100\n50\n75", "100"),
            ("-1\n-5\n-3", "-1"),
            ("0\n1\n-1", "1"),
            ("999\n1000\n998", "1000"),
        ],
    },
];

impl ProblemDef {
    fn build(&self) -> ExampleProblem {
        ExampleProblem {
            name: self.name,
            description: self.description,
            source: self.source,
            test_cases: self
                .cases
                .iter()
                .map(|(input, expected)| TestCase::new(*input, *expected))
                .collect(),
        }
    }
}

/// All example problems, in catalog order
pub fn examples() -> Vec<ExampleProblem> {
    PROBLEMS.iter().map(ProblemDef::build).collect()
}

/// Names of all example problems, in catalog order
pub fn example_names() -> Vec<&'static str> {
    PROBLEMS.iter().map(|p| p.name).collect()
}

/// Look up an example by exact name, falling back to a case-insensitive
/// substring match when exactly one problem qualifies
pub fn find_example(name: &str) -> Option<ExampleProblem> {
    if let Some(def) = PROBLEMS.iter().find(|p| p.name == name) {
        return Some(def.build());
    }

    let needle = name.to_lowercase();
    let mut matches = PROBLEMS
        .iter()
        .filter(|p| p.name.to_lowercase().contains(&needle));
    match (matches.next(), matches.next()) {
        (Some(def), None) => Some(def.build()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        let all = examples();
        assert_eq!(all.len(), 3);
        for problem in &all {
            assert_eq!(problem.test_cases.len(), 7, "{}", problem.name);
            assert!(!problem.source.trim().is_empty());
        }
    }

    #[test]
    fn test_find_example_exact() {
        let problem = find_example("Intermediate: Even or Odd").unwrap();
        assert_eq!(problem.test_cases[1], TestCase::new("7", "Odd"));
    }

    #[test]
    fn test_find_example_fuzzy() {
        let problem = find_example("maximum").unwrap();
        assert_eq!(problem.name, "Advanced: Maximum of Three");
    }

    #[test]
    fn test_find_example_ambiguous_or_missing() {
        // "o" appears in every name
        assert!(find_example("o").is_none());
        assert!(find_example("Fibonacci").is_none());
    }
}
