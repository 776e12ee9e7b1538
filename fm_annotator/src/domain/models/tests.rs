use super::*;
use cool_asserts::assert_matches;

fn event(status: &str, portal_run_id: &str) -> WorkflowRunStateChange {
    WorkflowRunStateChange {
        portal_run_id: portal_run_id.to_string(),
        status: status.into(),
        ..Default::default()
    }
}

#[test]
fn it_should_parse_statuses_case_insensitively() {
    assert_eq!(WorkflowStatus::from("succeeded"), WorkflowStatus::Succeeded);
    assert_eq!(WorkflowStatus::from("Failed"), WorkflowStatus::Failed);
    assert_eq!(WorkflowStatus::from("ABORTED"), WorkflowStatus::Aborted);
    assert_eq!(WorkflowStatus::from("rUnNiNg"), WorkflowStatus::Running);
    assert_eq!(
        WorkflowStatus::from("Queued"),
        WorkflowStatus::Other("Queued".to_string())
    );
}

#[test]
fn only_terminal_statuses_are_eligible() {
    for status in ["SUCCEEDED", "failed", "Aborted"] {
        assert!(WorkflowStatus::from(status).is_terminal(), "{status}");
    }

    for status in [
        "DRAFT",
        "READY",
        "RUNNING",
        "RESOLVED",
        "DEPRECATED",
        "",
        "SUCCEEDED ",
        "unknown",
    ] {
        assert!(!WorkflowStatus::from(status).is_terminal(), "{status}");
    }
}

#[test]
fn it_should_serialize_statuses() {
    assert_eq!(
        serde_json::to_string(&WorkflowStatus::from("succeeded")).unwrap(),
        r#""SUCCEEDED""#
    );
    assert_eq!(
        serde_json::to_string(&WorkflowStatus::from("Queued")).unwrap(),
        r#""Queued""#
    );
}

#[test]
fn it_should_build_the_portal_run_id_patch() {
    let event = event("SUCCEEDED", "202409021221e6e6");
    let patch = PortalRunIdPatch::from_event(&event);

    assert_eq!(
        patch.operations(),
        &[PatchOperation {
            op: PatchOp::Add,
            path: "/portalRunId",
            value: "202409021221e6e6",
        }]
    );
    assert_eq!(
        String::from_utf8(patch.to_bytes().unwrap()).unwrap(),
        r#"[{"op":"add","path":"/portalRunId","value":"202409021221e6e6"}]"#
    );
}

#[test]
fn patches_are_byte_stable() {
    let event = event("FAILED", "202409021221e6c6");
    let first = PortalRunIdPatch::from_event(&event).to_bytes().unwrap();
    let second = PortalRunIdPatch::from_event(&event.clone()).to_bytes().unwrap();

    assert_eq!(first, second);
}

#[test]
fn it_should_escape_patch_values() {
    let event = event("FAILED", r#"a"b\c"#);
    assert_eq!(
        String::from_utf8(PortalRunIdPatch::from_event(&event).to_bytes().unwrap()).unwrap(),
        r#"[{"op":"add","path":"/portalRunId","value":"a\"b\\c"}]"#
    );
}

#[test]
fn an_empty_portal_run_id_still_builds_a_patch() {
    let event = event("SUCCEEDED", "");
    assert_eq!(
        String::from_utf8(PortalRunIdPatch::from_event(&event).to_bytes().unwrap()).unwrap(),
        r#"[{"op":"add","path":"/portalRunId","value":""}]"#
    );
}

#[test]
fn key_match_queries() {
    assert_eq!(
        KeyMatch::Contains.query("abc"),
        vec![("key", "*abc*".to_string())]
    );
    assert_eq!(
        KeyMatch::PathSegment.query("abc"),
        vec![
            ("key", "*/abc/*".to_string()),
            ("currentState", "false".to_string())
        ]
    );
}

static DETAIL: &str = r#"{
    "portalRunId": "202409021221e6e6",
    "timestamp": "2024-09-02T12:21:00Z",
    "status": "Succeeded",
    "workflowName": "wts",
    "workflowVersion": "4.2.4",
    "workflowRunName": "umccr--automated--wts--4-2-4--202409021221e6e6",
    "linkedLibraries": [
        { "libraryId": "L2400001", "orcabusId": "lib.01J5M2JFE1JPYV62RYQEG99CP1" },
        { "libraryId": "L2400002", "orcabusId": "lib.01J5M2JFE1JPYV62RYQEG99CP2" }
    ],
    "payload": {
        "refId": "0d4c1f3e",
        "version": "2024.07.01",
        "data": { "inputs": { "tumorLibraryId": "L2400001" } }
    }
}"#;

#[test]
fn it_should_decode_a_bare_event() {
    let event = decode_event(DETAIL).unwrap();

    assert_eq!(event.portal_run_id, "202409021221e6e6");
    assert_eq!(event.status, WorkflowStatus::Succeeded);
    assert_eq!(event.workflow_name, "wts");
    assert_eq!(event.workflow_version, "4.2.4");
    assert_eq!(
        event.timestamp.unwrap().to_rfc3339(),
        "2024-09-02T12:21:00+00:00"
    );
    let libraries: Vec<_> = event
        .linked_libraries
        .iter()
        .map(|l| l.library_id.as_str())
        .collect();
    assert_eq!(libraries, vec!["L2400001", "L2400002"]);
    assert_matches!(event.payload, Some(Payload { version, data, .. }) => {
        assert_eq!(version, "2024.07.01");
        assert_eq!(data["inputs"]["tumorLibraryId"], "L2400001");
    });
}

#[test]
fn it_should_decode_an_enveloped_event() {
    let raw = format!(
        r#"{{"id":"1","detail-type":"WorkflowRunStateChange","source":"orcabus.workflowmanager","detail":{DETAIL}}}"#
    );

    assert_eq!(decode_event(&raw).unwrap(), decode_event(DETAIL).unwrap());
}

#[test]
fn missing_fields_default() {
    let event = decode_event(r#"{"status":"RUNNING"}"#).unwrap();

    assert_eq!(event.status, WorkflowStatus::Running);
    assert_eq!(event.portal_run_id, "");
    assert!(event.linked_libraries.is_empty());
    assert!(event.payload.is_none());
}

#[test]
fn null_fields_decode_as_missing() {
    let event = decode_event(
        r#"{
            "portalRunId": "202409021221e6e6",
            "status": "SUCCEEDED",
            "timestamp": null,
            "workflowName": null,
            "workflowVersion": null,
            "workflowRunName": null,
            "linkedLibraries": null,
            "payload": null
        }"#,
    )
    .unwrap();

    assert_eq!(
        event,
        WorkflowRunStateChange {
            portal_run_id: "202409021221e6e6".to_string(),
            status: WorkflowStatus::Succeeded,
            ..Default::default()
        }
    );
}

#[test]
fn a_null_portal_run_id_or_status_is_empty() {
    let event = decode_event(r#"{"portalRunId":null,"status":"RUNNING"}"#).unwrap();
    assert_eq!(event.portal_run_id, "");
    assert_eq!(event.status, WorkflowStatus::Running);

    let event = decode_event(r#"{"portalRunId":"202409021221e6e6","status":null}"#).unwrap();
    assert_eq!(event.status, WorkflowStatus::default());
    assert!(!event.status.is_terminal());
}

#[test]
fn null_fields_inside_libraries_and_payload_decode_as_missing() {
    let event = decode_event(
        r#"{
            "status": "FAILED",
            "linkedLibraries": [{ "libraryId": "L2400001", "orcabusId": null }],
            "payload": { "refId": null, "version": null, "data": null }
        }"#,
    )
    .unwrap();

    assert_eq!(
        event.linked_libraries,
        vec![LinkedLibrary {
            library_id: "L2400001".to_string(),
            orcabus_id: String::new(),
        }]
    );
    assert_eq!(event.payload, Some(Payload::default()));
}

#[test]
fn enveloped_events_may_carry_nulls() {
    let event = decode_event(
        r#"{
            "detail-type": "WorkflowRunStateChange",
            "source": "orcabus.workflowmanager",
            "account": null,
            "detail": { "portalRunId": "202409021221e6c6", "status": "Aborted", "linkedLibraries": null }
        }"#,
    )
    .unwrap();

    assert_eq!(event.portal_run_id, "202409021221e6c6");
    assert!(event.status.is_terminal());
}

#[test]
fn it_should_reject_malformed_events() {
    assert!(decode_event("not json").is_err());
    assert!(decode_event("[]").is_err());
    assert!(decode_event(r#""SUCCEEDED""#).is_err());
    assert!(
        decode_event(r#"{"detail-type":"x","source":"y","detail":"SUCCEEDED"}"#).is_err()
    );
    assert!(decode_event(r#"{"status":5}"#).is_err());
}

#[test]
fn queue_messages_without_a_body_fail_to_decode() {
    assert_matches!(
        QueueMessage::default().event(),
        Err(AnnotatorErr::Serialization(_))
    );

    let message = QueueMessage {
        message_id: Some("1".to_string()),
        body: Some(DETAIL.to_string()),
    };
    assert_eq!(
        message.event().unwrap().portal_run_id,
        "202409021221e6e6"
    );
}
