//! Small graph builders shared by unit tests.

use std::collections::BTreeMap;

use crate::domain::{Choice, Node, TaskGraph, TaskId, Topic, TopicId};

pub fn topic(id: u64, title: &str) -> Topic {
    Topic { id: TopicId(id), title: title.into(), description: String::new() }
}

pub fn correct(key: &str, next: Option<&str>) -> Choice {
    Choice {
        key: key.into(),
        text: format!("choice {}", key),
        is_mistake: false,
        mistake_type: String::new(),
        hint: String::new(),
        next: next.map(str::to_string),
    }
}

pub fn mistake(key: &str, mistake_type: &str, next: Option<&str>) -> Choice {
    Choice {
        key: key.into(),
        text: format!("choice {}", key),
        is_mistake: true,
        mistake_type: mistake_type.into(),
        hint: format!("hint for {}", key),
        next: next.map(str::to_string),
    }
}

pub fn node(key: &str, terminal: bool, choices: Vec<Choice>) -> Node {
    Node { key: key.into(), prompt: format!("prompt {}", key), terminal, choices }
}

fn graph(id: TaskId, topic_id: u64, nodes: Vec<Node>) -> TaskGraph {
    TaskGraph {
        id,
        topic_id: TopicId(topic_id),
        title: format!("task {}", id),
        description: String::new(),
        root: "root".into(),
        nodes: nodes.into_iter().map(|n| (n.key.clone(), n)).collect::<BTreeMap<_, _>>(),
    }
}

/// `root --(mistake)--> root`, `root --(ok)--> mid`, `mid --(ok)--> end (terminal)`.
pub fn three_step_graph(id: TaskId) -> TaskGraph {
    graph(
        id,
        1,
        vec![
            node("root", false, vec![mistake("oops", "sign error", Some("root")), correct("ok", Some("mid"))]),
            node("mid", false, vec![correct("ok", Some("end"))]),
            node("end", true, vec![]),
        ],
    )
}

/// `root --(ok, no next)--> completes`; a mistake with no next re-prompts root.
pub fn single_step_graph(id: TaskId) -> TaskGraph {
    graph(
        id,
        1,
        vec![node(
            "root",
            false,
            vec![correct("ok", None), mistake("slip", "wrong base", None)],
        )],
    )
}
