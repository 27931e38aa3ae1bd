use chrono::{SecondsFormat, Utc};
use rand::{Rng, seq::IndexedRandom};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::args::{BodyFormat, PayloadMode};

const SCHEMA_VERSION: &str = "1.0";

const EVENT_TYPES: [(&str, u8); 2] = [("issue", 8), ("time_entry", 2)];
const ACTIONS: [(&str, u8); 3] = [("created", 3), ("updated", 6), ("deleted", 1)];
const PROJECTS: [((u32, &str, &str), u8); 3] = [
    ((1, "alpha", "Project Alpha"), 5),
    ((2, "billing", "Billing Service"), 3),
    ((3, "infra", "Infrastructure"), 2),
];
const USERS: [((u32, &str, &str), u8); 4] = [
    ((5, "jsmith", "John Smith"), 5),
    ((6, "adoe", "Ann Doe"), 3),
    ((7, "mlee", "Min Lee"), 2),
    ((1, "admin", "Redmine Admin"), 1),
];
const TRACKERS: [((u32, &str), u8); 3] = [((1, "Bug"), 5), ((2, "Feature"), 3), ((3, "Support"), 2)];
const STATUSES: [((u32, &str), u8); 4] = [
    ((1, "New"), 4),
    ((2, "In Progress"), 4),
    ((3, "Resolved"), 2),
    ((5, "Closed"), 1),
];
const PRIORITIES: [((u32, &str), u8); 3] = [((2, "Normal"), 6), ((3, "High"), 3), ((4, "Urgent"), 1)];
const ACTIVITIES: [((u32, &str), u8); 3] = [((8, "Design"), 2), ((9, "Development"), 6), ((10, "Review"), 2)];
const SUBJECTS: [(&str, u8); 5] = [
    ("Login page returns 500", 5),
    ("Add CSV export to reports", 3),
    ("Webhook retries are too aggressive", 2),
    ("Upgrade database driver", 2),
    ("Typo in invoice footer", 1),
];

/// One request ready to send: headers plus body.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub event: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

pub fn generate_delivery<R: Rng + ?Sized>(
    rng: &mut R,
    mode: PayloadMode,
    format: BodyFormat,
    sequence: u64,
) -> Delivery {
    let event_id = Uuid::new_v4();
    let event_type = *pick(rng, &EVENT_TYPES);
    let action = *pick(rng, &ACTIONS);
    let event = format!("{event_type}.{action}");
    let payload = build_payload(rng, mode, event_id, event_type, action, sequence);

    let (content_type, body) = match format {
        BodyFormat::Json => ("application/json; charset=utf-8", payload.to_string()),
        BodyFormat::Plain => ("text/plain; charset=utf-8", summarize(&event, &payload)),
    };
    let headers = vec![
        ("Content-Type", content_type.to_string()),
        (
            "User-Agent",
            format!("RedmineWebhook/{} (hook-sender)", env!("CARGO_PKG_VERSION")),
        ),
        ("X-Redmine-Event-ID", event_id.to_string()),
        ("X-Redmine-Event", event.clone()),
        ("X-Redmine-Delivery", Uuid::new_v4().to_string()),
    ];
    Delivery {
        event,
        headers,
        body,
    }
}

fn build_payload<R: Rng + ?Sized>(
    rng: &mut R,
    mode: PayloadMode,
    event_id: Uuid,
    event_type: &str,
    action: &str,
    sequence: u64,
) -> Value {
    let (project_id, identifier, project_name) = *pick(rng, &PROJECTS);
    let project = json!({ "id": project_id, "identifier": identifier, "name": project_name });
    let actor = user(pick(rng, &USERS));

    let mut payload = json!({
        "event_id": event_id.to_string(),
        "event_type": event_type,
        "action": action,
        "occurred_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "sequence_number": sequence,
        "delivery_mode": mode.as_str(),
        "schema_version": SCHEMA_VERSION,
        "actor": actor,
        "project": project,
    });

    let resource = match event_type {
        "issue" => issue(rng, mode, action, &project),
        _ => time_entry(rng, action, &project),
    };
    payload[event_type] = resource;

    if action == "updated" && event_type == "issue" {
        let (old_id, old_name) = *pick(rng, &STATUSES);
        let (new_id, new_name) = *pick(rng, &STATUSES);
        payload["changes"] = json!([{
            "field": "status_id",
            "kind": "attribute",
            "old": { "raw": old_id, "text": old_name },
            "new": { "raw": new_id, "text": new_name },
        }]);
    }
    payload
}

fn issue<R: Rng + ?Sized>(rng: &mut R, mode: PayloadMode, action: &str, project: &Value) -> Value {
    let (tracker_id, tracker) = *pick(rng, &TRACKERS);
    let (status_id, status) = *pick(rng, &STATUSES);
    let (priority_id, priority) = *pick(rng, &PRIORITIES);
    let mut issue = json!({
        "id": rng.random_range(1..10_000),
        "subject": *pick(rng, &SUBJECTS),
        "tracker": { "id": tracker_id, "name": tracker },
        "status": { "id": status_id, "name": status },
        "priority": { "id": priority_id, "name": priority },
    });
    if action == "deleted" {
        issue["snapshot_type"] = json!("pre_delete");
        issue["project"] = project.clone();
    } else if mode == PayloadMode::Full {
        issue["description"] = json!("Steps to reproduce:\n1. Open the page\n2. Observe the error");
        issue["author"] = user(pick(rng, &USERS));
        issue["assigned_to"] = if rng.random_bool(0.7) {
            user(pick(rng, &USERS))
        } else {
            Value::Null
        };
        issue["done_ratio"] = json!(rng.random_range(0..=10) * 10);
        issue["estimated_hours"] = json!(rng.random_range(1..=40));
    }
    issue
}

fn time_entry<R: Rng + ?Sized>(rng: &mut R, action: &str, project: &Value) -> Value {
    let (activity_id, activity) = *pick(rng, &ACTIVITIES);
    let mut entry = json!({
        "id": rng.random_range(1..10_000),
        "hours": f64::from(rng.random_range(1..=16u32)) / 2.0,
        "spent_on": Utc::now().format("%Y-%m-%d").to_string(),
        "comments": "Worked on the ticket",
        "activity": { "id": activity_id, "name": activity },
        "user": user(pick(rng, &USERS)),
        "issue": { "id": rng.random_range(1..10_000), "subject": *pick(rng, &SUBJECTS) },
    });
    if action == "deleted" {
        entry["snapshot_type"] = json!("pre_delete");
        entry["project"] = project.clone();
    }
    entry
}

fn user(&(id, login, name): &(u32, &str, &str)) -> Value {
    json!({ "id": id, "login": login, "name": name })
}

fn summarize(event: &str, payload: &Value) -> String {
    let login = payload["actor"]["login"].as_str().unwrap_or("someone");
    let project = payload["project"]["identifier"].as_str().unwrap_or("?");
    format!("{event} in {project} by {login} (seq {})", payload["sequence_number"])
}

fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [(T, u8)]) -> &'a T {
    // Every table is non-empty with non-zero weights.
    items
        .choose_weighted(rng, |(_, w)| *w)
        .map(|(item, _)| item)
        .unwrap_or(&items[0].0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use asserting::prelude::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn header<'a>(delivery: &'a Delivery, name: &str) -> &'a str {
        delivery
            .headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn json_delivery_has_envelope_and_matching_headers() {
        let mut rng = StdRng::seed_from_u64(7);
        let delivery = generate_delivery(&mut rng, PayloadMode::Minimal, BodyFormat::Json, 42);
        let payload: Value = serde_json::from_str(&delivery.body).unwrap();

        assert_eq!(payload["sequence_number"], 42);
        assert_eq!(payload["schema_version"], "1.0");
        assert_eq!(payload["delivery_mode"], "minimal");
        assert_eq!(header(&delivery, "X-Redmine-Event-ID"), payload["event_id"].as_str().unwrap());
        let event = format!(
            "{}.{}",
            payload["event_type"].as_str().unwrap(),
            payload["action"].as_str().unwrap()
        );
        assert_eq!(header(&delivery, "X-Redmine-Event"), event);
        assert_eq!(delivery.event, event);
        assert_eq!(header(&delivery, "Content-Type"), "application/json; charset=utf-8");
        assert_that!(header(&delivery, "User-Agent").starts_with("RedmineWebhook/")).is_true();
    }

    #[test]
    fn resource_key_follows_event_type() {
        let mut rng = StdRng::seed_from_u64(1);
        for seq in 0..200 {
            let delivery = generate_delivery(&mut rng, PayloadMode::Full, BodyFormat::Json, seq);
            let payload: Value = serde_json::from_str(&delivery.body).unwrap();
            let event_type = payload["event_type"].as_str().unwrap();
            let action = payload["action"].as_str().unwrap();
            assert_that!(payload[event_type].is_object()).is_true();
            if action == "deleted" {
                assert_eq!(payload[event_type]["snapshot_type"], "pre_delete");
            }
            if action == "updated" && event_type == "issue" {
                assert_that!(payload["changes"].is_array()).is_true();
            }
        }
    }

    #[test]
    fn full_mode_adds_issue_details() {
        let mut rng = StdRng::seed_from_u64(3);
        let found = (0..200).any(|seq| {
            let delivery = generate_delivery(&mut rng, PayloadMode::Full, BodyFormat::Json, seq);
            let payload: Value = serde_json::from_str(&delivery.body).unwrap();
            payload["event_type"] == "issue"
                && payload["action"] != "deleted"
                && payload["issue"]["description"].is_string()
        });
        assert_that!(found).is_true();
    }

    #[test]
    fn plain_delivery_is_not_json() {
        let mut rng = StdRng::seed_from_u64(11);
        let delivery = generate_delivery(&mut rng, PayloadMode::Minimal, BodyFormat::Plain, 5);
        assert_that!(serde_json::from_str::<Value>(&delivery.body).is_err()).is_true();
        assert_that!(delivery.body.starts_with(&delivery.event)).is_true();
        assert_eq!(header(&delivery, "Content-Type"), "text/plain; charset=utf-8");
    }

    #[test]
    fn delivery_ids_are_unique() {
        let mut rng = StdRng::seed_from_u64(2);
        let a = generate_delivery(&mut rng, PayloadMode::Minimal, BodyFormat::Json, 1);
        let b = generate_delivery(&mut rng, PayloadMode::Minimal, BodyFormat::Json, 2);
        assert_ne!(header(&a, "X-Redmine-Delivery"), header(&b, "X-Redmine-Delivery"));
    }
}
