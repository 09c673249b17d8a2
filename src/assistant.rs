//! Teacher assistant drafts: lesson plans, homework, tests and mistake
//! explanations built from the class's current mistake statistics.
//!
//! Pure text generation from (goal, topic, mistakes). No network calls.

use std::str::FromStr;

use crate::analytics::MistakeCount;
use crate::util::fill_template;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Goal {
    Plan,
    Homework,
    Test,
    Mistakes,
}

impl FromStr for Goal {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "plan" => Ok(Goal::Plan),
            "homework" => Ok(Goal::Homework),
            "test" => Ok(Goal::Test),
            "mistakes" => Ok(Goal::Mistakes),
            _ => Err(()),
        }
    }
}

const PLAN_TEMPLATE: &str = "Lesson goal: consolidate {topic} by walking through solutions.
Structure:
1. Warm-up (5 min): oral examples.
2. Short explanation (10 min): show the reference solving algorithm.
3. Practice (20 min): students work through 3 guided tasks.
4. Mistake review (10 min): based on the class's latest statistics.";

const HOMEWORK_TEMPLATE: &str = "Homework on: {topic}
1. Find the price of an item after two successive discounts of 10% and 5%.
2. Increase a number by 12% and explain each step in words.
3. Write an equation from a word problem and solve it step by step.";

const TEST_TEMPLATE: &str = "Test (2 variants) on: {topic}
Variant A:
- Find the final price after a 15% discount.
- Solve 3x + 12 = 42.
- Describe how you check your answer.
Variant B:
- What percent of 300 is 45?
- Solve 2(x - 5) = 18.
- Explain why the chosen steps are correct.";

fn top_lines(mistakes: &[MistakeCount], limit: usize) -> Vec<String> {
    mistakes
        .iter()
        .take(limit)
        .map(|m| format!("- {} ({})", m.mistake_type, m.count))
        .collect()
}

/// Produce a draft for the given goal. `mistakes` is expected in frequency order.
pub fn draft(goal: Option<Goal>, topic: &str, mistakes: &[MistakeCount]) -> String {
    let topic = topic.trim();
    let with_topic = |tpl: &str, fallback: &str| {
        fill_template(tpl, &[("topic", if topic.is_empty() { fallback } else { topic })])
    };

    let mut lines: Vec<String> = Vec::new();
    match goal {
        None => return "Choose a request type: plan, homework, test or mistakes.".into(),
        Some(Goal::Plan) => {
            lines.push(with_topic(PLAN_TEMPLATE, "percentages and equations"));
            if !mistakes.is_empty() {
                lines.push("Top mistakes:".into());
                lines.extend(top_lines(mistakes, 3));
            }
        }
        Some(Goal::Homework) => {
            lines.push(with_topic(HOMEWORK_TEMPLATE, "percentages in everyday problems"));
            if !mistakes.is_empty() {
                lines.push("Hints for students:".into());
                lines.extend(top_lines(mistakes, 2));
            }
        }
        Some(Goal::Test) => {
            lines.push(with_topic(TEST_TEMPLATE, "percentages and linear equations"));
            if !mistakes.is_empty() {
                lines.push("What to watch for when grading:".into());
                lines.extend(top_lines(mistakes, 3));
            }
        }
        Some(Goal::Mistakes) => {
            if mistakes.is_empty() {
                return "No recent mistakes yet. Great progress!".into();
            }
            lines.extend(mistakes.iter().map(|m| {
                format!(
                    "- {}: seen {} time(s). Ask students to say each step out loud and check units.",
                    m.mistake_type, m.count
                )
            }));
            if !topic.is_empty() {
                lines.push(format!("Topic context: {}", topic));
            }
        }
    }
    lines.join("\n")
}
