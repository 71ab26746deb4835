//! JSON records sent to and read from ArchivesSpace

use std::collections::HashMap;

use serde_json::{Map, Value, json};

use crate::accession::{AccessionRow, EventEntry};

/// Title used when a create row leaves Title empty
pub const NO_LABEL: &str = "[no label]";

/// Extents described by a row. Replaces any extents already on the record.
pub fn build_extents(row: &AccessionRow) -> Vec<Value> {
    let mut extents = Vec::new();

    if let Some(extent_type) = &row.extent_type {
        extents.push(json!({
            "number": "1",
            "portion": "whole",
            "extent_type": extent_type,
            "jsonmodel_type": "extent",
        }));
    }

    if let Some(bytes) = &row.bytes {
        let mut extent = json!({
            "number": bytes,
            "portion": "whole",
            "extent_type": "bytes",
            "jsonmodel_type": "extent",
        });
        if let Some(summary) = &row.container_summary {
            extent["container_summary"] = json!(summary);
        }
        extents.push(extent);
    }

    extents
}

/// Instance linking a record to a top container
pub fn container_instance(top_container_uri: &str) -> Value {
    json!({
        "instance_type": "mixed_materials",
        "jsonmodel_type": "instance",
        "sub_container": {
            "jsonmodel_type": "sub_container",
            "top_container": { "ref": top_container_uri },
        },
    })
}

/// Top container URIs linked through a record's non-digital instances
pub fn linked_top_containers(record: &Value) -> Vec<String> {
    instance_containers(record.get("instances"))
}

fn instance_containers(instances: Option<&Value>) -> Vec<String> {
    instances
        .and_then(|i| i.as_array())
        .map(|instances| {
            instances
                .iter()
                .filter(|i| i.get("instance_type").and_then(|t| t.as_str()) != Some("digital_object"))
                .filter_map(|i| i.pointer("/sub_container/top_container/ref"))
                .filter_map(|r| r.as_str())
                .map(|r| r.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// First ancestor reference of an archival object
pub fn first_ancestor(record: &Value) -> Option<&str> {
    record.pointer("/ancestors/0/ref").and_then(|r| r.as_str())
}

/// New item-level archival object for a create row
pub fn new_archival_object(
    row: &AccessionRow,
    repo_id: &str,
    resource_id: &str,
    top_container_uri: Option<&str>,
) -> Value {
    let title = if row.title.is_empty() {
        NO_LABEL
    } else {
        row.title.as_str()
    };

    let instances: Vec<Value> = top_container_uri
        .map(container_instance)
        .into_iter()
        .collect();

    json!({
        "publish": true,
        "title": title,
        "level": "item",
        "component_id": row.component_id,
        "jsonmodel_type": "archival_object",
        "resource": { "ref": format!("/repositories/{}/resources/{}", repo_id, resource_id) },
        "parent": {
            "ref": format!("/repositories/{}/archival_objects/{}", repo_id, row.parent.archival_object_id)
        },
        "extents": build_extents(row),
        "instances": instances,
    })
}

/// Apply an update row to an existing archival object
///
/// Sets the component id, replaces extents, and links the top container if
/// the record is not linked to it yet. Existing instances are left alone.
pub fn apply_update(record: &mut Map<String, Value>, row: &AccessionRow, top_container_uri: Option<&str>) {
    record.insert("component_id".to_string(), json!(row.component_id));
    record.insert("extents".to_string(), Value::Array(build_extents(row)));

    let Some(uri) = top_container_uri else {
        return;
    };
    if instance_containers(record.get("instances")).iter().any(|l| l == uri) {
        return;
    }
    let instances = record.entry("instances").or_insert_with(|| json!([]));
    if !instances.is_array() {
        *instances = json!([]);
    }
    if let Some(list) = instances.as_array_mut() {
        list.push(container_instance(uri));
    }
}

/// Event linked to an archival object and authorized by an agent
pub fn new_event(event: &EventEntry, agent_uri: &str, object_uri: &str) -> Value {
    json!({
        "event_type": event.event_type,
        "jsonmodel_type": "event",
        "outcome": event.outcome,
        "outcome_note": event.outcome_note,
        "linked_agents": [{ "role": "authorizer", "ref": agent_uri }],
        "linked_records": [{ "role": "source", "ref": object_uri }],
        "date": {
            "begin": event.begin,
            "date_type": "single",
            "label": "event",
            "jsonmodel_type": "date",
        },
    })
}

/// Map of repository code to numeric repository id from `GET /repositories`
pub fn repository_map(repositories: &Value) -> HashMap<String, String> {
    repositories
        .as_array()
        .map(|repos| {
            repos
                .iter()
                .filter_map(|repo| {
                    let code = repo.get("repo_code")?.as_str()?;
                    let id = repo.get("uri")?.as_str()?.rsplit('/').next()?;
                    Some((code.to_string(), id.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// URI reported by a create/update response
pub fn response_uri(response: &Value) -> Option<&str> {
    response.get("uri").and_then(|u| u.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accession::ParentRecord;

    fn row() -> AccessionRow {
        AccessionRow {
            index: 1,
            line: 3,
            repository_code: "mssa".to_string(),
            parent: ParentRecord {
                archival_object_id: "900".to_string(),
                resource_id: Some("45".to_string()),
            },
            title: String::new(),
            component_id: "dass-001".to_string(),
            extent_type: Some("files".to_string()),
            bytes: Some("2048".to_string()),
            container_summary: Some("1 disk image".to_string()),
            top_container: Some("7".to_string()),
            events: vec![EventEntry {
                slot: 1,
                event_type: "ingestion".to_string(),
                outcome: "pass".to_string(),
                begin: "2024-05-01".to_string(),
                outcome_note: "ok".to_string(),
            }],
        }
    }

    #[test]
    fn test_build_extents() {
        let extents = build_extents(&row());
        assert_eq!(extents.len(), 2);
        assert_eq!(extents[0]["extent_type"], "files");
        assert_eq!(extents[0]["number"], "1");
        assert!(extents[0].get("container_summary").is_none());
        assert_eq!(extents[1]["extent_type"], "bytes");
        assert_eq!(extents[1]["number"], "2048");
        assert_eq!(extents[1]["container_summary"], "1 disk image");
    }

    #[test]
    fn test_build_extents_empty() {
        let mut r = row();
        r.extent_type = None;
        r.bytes = None;
        assert!(build_extents(&r).is_empty());
    }

    #[test]
    fn test_new_archival_object() {
        let obj = new_archival_object(&row(), "12", "45", Some("/repositories/12/top_containers/3"));
        assert_eq!(obj["title"], NO_LABEL);
        assert_eq!(obj["level"], "item");
        assert_eq!(obj["resource"]["ref"], "/repositories/12/resources/45");
        assert_eq!(obj["parent"]["ref"], "/repositories/12/archival_objects/900");
        assert_eq!(obj["instances"][0]["sub_container"]["top_container"]["ref"], "/repositories/12/top_containers/3");
        assert_eq!(obj["extents"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_apply_update_links_container_once() {
        let mut record = json!({
            "uri": "/repositories/12/archival_objects/900",
            "component_id": "old",
            "extents": [{ "number": "9", "extent_type": "linear_feet" }],
            "instances": [
                { "instance_type": "digital_object", "digital_object": { "ref": "/repositories/12/digital_objects/1" } },
                container_instance("/repositories/12/top_containers/3"),
            ],
        });

        let fields = record.as_object_mut().unwrap();
        apply_update(fields, &row(), Some("/repositories/12/top_containers/3"));
        assert_eq!(fields["component_id"], "dass-001");
        assert_eq!(fields["extents"].as_array().unwrap().len(), 2);
        assert_eq!(fields["instances"].as_array().unwrap().len(), 2);

        apply_update(fields, &row(), Some("/repositories/12/top_containers/4"));
        assert_eq!(fields["instances"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_apply_update_without_instances() {
        let mut record = json!({ "uri": "/repositories/12/archival_objects/900" });
        apply_update(record.as_object_mut().unwrap(), &row(), Some("/repositories/12/top_containers/3"));
        assert_eq!(linked_top_containers(&record), vec!["/repositories/12/top_containers/3"]);
    }

    #[test]
    fn test_apply_update_replaces_non_list_instances() {
        let mut record = json!({ "instances": "broken", "extents": null });
        apply_update(record.as_object_mut().unwrap(), &row(), Some("/repositories/12/top_containers/3"));
        assert_eq!(record["extents"].as_array().unwrap().len(), 2);
        assert_eq!(linked_top_containers(&record), vec!["/repositories/12/top_containers/3"]);
    }

    #[test]
    fn test_linked_top_containers_skips_digital_objects() {
        let record = json!({
            "instances": [
                { "instance_type": "digital_object" },
                container_instance("/repositories/2/top_containers/8"),
            ]
        });
        assert_eq!(linked_top_containers(&record), vec!["/repositories/2/top_containers/8"]);
        assert!(linked_top_containers(&json!({})).is_empty());
    }

    #[test]
    fn test_new_event() {
        let r = row();
        let event = new_event(&r.events[0], "/agents/people/5", "/repositories/12/archival_objects/901");
        assert_eq!(event["event_type"], "ingestion");
        assert_eq!(event["linked_agents"][0]["role"], "authorizer");
        assert_eq!(event["linked_records"][0]["ref"], "/repositories/12/archival_objects/901");
        assert_eq!(event["date"]["begin"], "2024-05-01");
    }

    #[test]
    fn test_repository_map() {
        let repos = json!([
            { "repo_code": "mssa", "uri": "/repositories/12" },
            { "repo_code": "brbl", "uri": "/repositories/11" },
            { "name": "broken" },
        ]);
        let map = repository_map(&repos);
        assert_eq!(map.len(), 2);
        assert_eq!(map["mssa"], "12");
        assert_eq!(map["brbl"], "11");
    }

    #[test]
    fn test_first_ancestor_and_response_uri() {
        let record = json!({ "ancestors": [{ "ref": "/repositories/2/archival_objects/1" }] });
        assert_eq!(first_ancestor(&record), Some("/repositories/2/archival_objects/1"));
        assert_eq!(response_uri(&json!({ "uri": "/a/1", "status": "Created" })), Some("/a/1"));
        assert_eq!(response_uri(&json!({})), None);
    }
}
