//! Built-in content that makes the service useful without any config file:
//! two topics, a handful of guided tasks, and one demo class.

use crate::domain::{Choice, Node, TaskGraph, TaskId, Topic, TopicId};

pub const PERCENTAGES: TopicId = TopicId(1);
pub const EQUATIONS: TopicId = TopicId(2);

pub fn seed_topics() -> Vec<Topic> {
  vec![
    Topic { id: PERCENTAGES, title: "Percentages".into(), description: "Discounts, taxes and growth.".into() },
    Topic { id: EQUATIONS, title: "Equations".into(), description: "Linear equations and proportions.".into() },
  ]
}

/// Demo class: (id, name, invite code, students).
pub fn seed_class() -> (u64, &'static str, &'static str, Vec<(u64, &'static str)>) {
  (1, "7A", "START-7A", vec![(1, "Demo student")])
}

fn ok(key: &str, text: &str, next: Option<&str>) -> Choice {
  Choice {
    key: key.into(),
    text: text.into(),
    is_mistake: false,
    mistake_type: String::new(),
    hint: String::new(),
    next: next.map(str::to_string),
  }
}

fn wrong(key: &str, text: &str, next: &str, mistake_type: &str, hint: &str) -> Choice {
  Choice {
    key: key.into(),
    text: text.into(),
    is_mistake: true,
    mistake_type: mistake_type.into(),
    hint: hint.into(),
    next: Some(next.into()),
  }
}

fn step(key: &str, prompt: &str, choices: Vec<Choice>) -> Node {
  Node { key: key.into(), prompt: prompt.into(), terminal: false, choices }
}

fn done(prompt: &str) -> Node {
  Node { key: "done".into(), prompt: prompt.into(), terminal: true, choices: Vec::new() }
}

fn task(id: u64, topic_id: TopicId, title: &str, description: &str, nodes: Vec<Node>) -> TaskGraph {
  TaskGraph {
    id: TaskId(id),
    topic_id,
    title: title.into(),
    description: description.into(),
    root: "start".into(),
    nodes: nodes.into_iter().map(|n| (n.key.clone(), n)).collect(),
  }
}

pub fn seed_tasks() -> Vec<TaskGraph> {
  vec![
    task(1, PERCENTAGES, "Discounted price", "Find the price after a discount.", vec![
      step("start", "An item costs 2500 with a 20% discount. How do you find the new price?", vec![
        ok("c1", "Find 20% and subtract it", Some("calc")),
        wrong("c2", "Multiply by 1.2", "start", "wrong multiplier", "1.2 increases the price."),
        wrong("c3", "0.2 of the price is the answer", "start", "result confused", "0.2 of the price is the discount, not the new price."),
      ]),
      step("calc", "How much is the discount?", vec![
        ok("c4", "2500 x 0.2 = 500", Some("done")),
        wrong("c5", "2500 x 0.8 = 2000", "calc", "share confused", "0.8 is what remains, not the discount."),
      ]),
      done("The final price is 2000. Task complete."),
    ]),
    task(2, PERCENTAGES, "Two discounts in a row", "Combine 10% and 5% discounts.", vec![
      step("start", "An item costs 3000. First 10% off, then another 5%. What do you do?", vec![
        ok("d1", "Apply 0.9, then 0.95", Some("check")),
        wrong("d2", "Add the discounts: 15% at once", "start", "composition error", "Discounts apply one after another, not as a sum."),
        wrong("d3", "Subtract 15% of 3000 once", "start", "percent of the wrong base", "The second discount is taken from the reduced price."),
      ]),
      step("check", "How do you check the result?", vec![
        ok("d4", "Confirm the price equals 3000 x 0.9 x 0.95", Some("done")),
        wrong("d5", "Subtract 15% again to check", "check", "repeated discount", "The check compares against the original price."),
      ]),
      done("The combined discount is computed."),
    ]),
    task(3, PERCENTAGES, "Coupon discount", "30% off a book.", vec![
      step("start", "A book costs 900 and the coupon gives 30% off. What do you do?", vec![
        ok("k1", "900 x 0.7", None),
        wrong("k2", "900 / 0.7", "start", "division instead of multiplication", "0.7 is the remaining share; multiply by it."),
        wrong("k3", "900 - 30", "start", "percent as a number", "30 is not 30% of 900."),
      ]),
    ]),
    task(4, EQUATIONS, "Solve 3x + 12 = 42", "A basic linear equation.", vec![
      step("start", "3x + 12 = 42. What comes first?", vec![
        ok("e1", "Subtract 12 from both sides", Some("divide")),
        wrong("e2", "Divide 42 by 3 right away", "start", "skipped step", "Remove the constant term first."),
        wrong("e3", "Add 12", "start", "wrong direction", "You need to remove 12, not add it."),
      ]),
      step("divide", "Now 3x = 30. Next?", vec![
        ok("e4", "Divide both sides by 3", Some("done")),
        wrong("e5", "Add 3 to x", "divide", "wrong operation", "Undo multiplication with division."),
      ]),
      done("x = 10. Solution written down."),
    ]),
    task(5, EQUATIONS, "Proportion", "a/5 = 18/30.", vec![
      step("start", "a/5 = 18/30. How do you find a?", vec![
        ok("p1", "Cross-multiply: 30a = 18 x 5", Some("solve")),
        wrong("p2", "a = 18 / 30", "start", "forgotten denominator", "Account for the division by 5."),
        wrong("p3", "5a = 18 x 30", "solve", "cross-multiplication error", "Each numerator multiplies the opposite denominator."),
      ]),
      step("solve", "30a = 90. What now?", vec![
        ok("p4", "Divide both sides by 30", Some("done")),
        wrong("p5", "Divide by 5", "solve", "divided by the wrong number", "To remove 30, divide by 30."),
      ]),
      done("a = 3. Proportion solved."),
    ]),
  ]
}
