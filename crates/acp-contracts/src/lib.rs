//! # acp-contracts
//!
//! Trace records for ACP agent runs.
//!
//! `RunMeta` describes one run and `AgentStep` describes one step inside it.
//! No I/O lives in this crate, only data definitions, validation, JSON
//! encoding and the shared error type.

pub mod clock;
pub mod error;
pub mod run;
pub mod step;

pub use error::{TraceError, TraceResult};
pub use run::{RunMeta, RunStatus};
pub use step::{AgentStep, Payload, StepPhase, StepStatus};

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            other => panic!("payload fixture must be an object, got {}", other),
        }
    }

    fn sample_run() -> RunMeta {
        RunMeta::new("r1", "1.0", "gpt-x", 1000.0).unwrap()
    }

    fn assert_validation(err: TraceError, expected_field: &str) {
        match err {
            TraceError::Validation { field, .. } => assert_eq!(field, expected_field),
            other => panic!("expected Validation on '{}', got {:?}", expected_field, other),
        }
    }

    // ── RunMeta construction ─────────────────────────────────────────────────

    #[test]
    fn run_meta_new_applies_defaults() {
        let meta = sample_run();

        assert_eq!(meta.run_id, "r1");
        assert_eq!(meta.agent_version, "1.0");
        assert_eq!(meta.llm, "gpt-x");
        assert_eq!(meta.created_at, 1000.0);
        assert_eq!(meta.status, RunStatus::Active);
        assert_eq!(meta.step_count, 0);
        assert!(!meta.truncated);
        assert!(meta.tools.is_empty());
        assert_eq!(meta.seed, None);
        assert_eq!(meta.temperature, 0.0);
        assert_eq!(meta.termination_reason, None);
    }

    #[test]
    fn run_meta_setters_keep_supplied_values() {
        let meta = sample_run()
            .with_tools(["search", "calculator", "browser"])
            .with_seed(42)
            .with_temperature(0.7)
            .unwrap();

        assert_eq!(meta.tools, vec!["search", "calculator", "browser"]);
        assert_eq!(meta.seed, Some(42));
        assert_eq!(meta.temperature, 0.7);
    }

    #[test]
    fn run_meta_rejects_empty_run_id() {
        let err = RunMeta::new("", "1.0", "gpt-x", 1000.0).unwrap_err();
        assert_validation(err, "run_id");
    }

    #[test]
    fn run_meta_rejects_non_finite_created_at() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = RunMeta::new("r1", "1.0", "gpt-x", bad).unwrap_err();
            assert_validation(err, "created_at");
        }
    }

    #[test]
    fn run_meta_rejects_negative_temperature() {
        let err = sample_run().with_temperature(-0.1).unwrap_err();
        assert_validation(err, "temperature");

        let err = sample_run().with_temperature(f64::NAN).unwrap_err();
        assert_validation(err, "temperature");
    }

    #[test]
    fn run_status_rejects_unknown_strings() {
        for bad in ["", "running", "ACTIVE", "done", "succeeded"] {
            let err = bad.parse::<RunStatus>().unwrap_err();
            assert_validation(err, "status");
        }
        for status in RunStatus::ALL {
            assert_eq!(status.as_str().parse::<RunStatus>().unwrap(), status);
        }
    }

    #[test]
    fn run_meta_decode_rejects_unknown_status() {
        let text = r#"{"run_id":"r1","agent_version":"1.0","llm":"gpt-x","created_at":1000.0,"status":"paused"}"#;
        let err = RunMeta::from_json(text).unwrap_err();
        assert!(matches!(err, TraceError::Validation { .. }));
    }

    #[test]
    fn run_meta_decode_rejects_negative_temperature() {
        let text = r#"{"run_id":"r1","agent_version":"1.0","llm":"gpt-x","created_at":1000.0,"temperature":-1.5}"#;
        assert_validation(RunMeta::from_json(text).unwrap_err(), "temperature");
    }

    #[test]
    fn run_meta_decode_fills_defaults() {
        let text = r#"{"run_id":"r9","agent_version":"2.1","llm":"local","created_at":12.5}"#;
        let meta = RunMeta::from_json(text).unwrap();
        assert_eq!(meta, RunMeta::new("r9", "2.1", "local", 12.5).unwrap());
    }

    #[test]
    fn run_meta_decode_malformed_text_is_serialization_error() {
        let err = RunMeta::from_json("{\"run_id\": ").unwrap_err();
        assert!(matches!(err, TraceError::Serialization { .. }));
    }

    #[test]
    fn generated_run_ids_are_unique() {
        let ids: std::collections::HashSet<String> =
            (0..100).map(|_| RunMeta::generate_run_id()).collect();
        assert_eq!(ids.len(), 100);
    }

    // ── RunMeta transitions ──────────────────────────────────────────────────

    #[test]
    fn transition_to_success_sets_reason() {
        let mut meta = sample_run();
        meta.transition(RunStatus::Success, "goal reached").unwrap();

        assert_eq!(meta.status, RunStatus::Success);
        assert_eq!(meta.termination_reason.as_deref(), Some("goal reached"));
        assert!(meta.is_finished());
        meta.validate().unwrap();
    }

    #[test]
    fn terminal_status_is_terminal() {
        let mut meta = sample_run();
        meta.transition(RunStatus::Success, "goal reached").unwrap();

        let err = meta.transition(RunStatus::Failure, "late error").unwrap_err();
        match err {
            TraceError::InvalidTransition { from, to } => {
                assert_eq!(from, "success");
                assert_eq!(to, "failure");
            }
            other => panic!("expected InvalidTransition, got {:?}", other),
        }

        let err = meta.transition(RunStatus::Active, "resume").unwrap_err();
        assert!(matches!(err, TraceError::InvalidTransition { .. }));

        // The failed attempts must not have touched the record.
        assert_eq!(meta.status, RunStatus::Success);
        assert_eq!(meta.termination_reason.as_deref(), Some("goal reached"));
    }

    #[test]
    fn transition_active_to_active_is_rejected() {
        let mut meta = sample_run();
        let err = meta.transition(RunStatus::Active, "noop").unwrap_err();
        assert!(matches!(err, TraceError::InvalidTransition { .. }));
        assert_eq!(meta.status, RunStatus::Active);
    }

    #[test]
    fn transition_requires_reason() {
        let mut meta = sample_run();
        let err = meta.transition(RunStatus::Stopped, "").unwrap_err();
        assert_validation(err, "termination_reason");
        assert_eq!(meta.status, RunStatus::Active);
    }

    #[test]
    fn validate_checks_termination_reason_convention() {
        let mut meta = sample_run();
        meta.status = RunStatus::Exhausted;
        assert_validation(meta.validate().unwrap_err(), "termination_reason");

        let mut meta = sample_run();
        meta.termination_reason = Some("premature".to_string());
        assert_validation(meta.validate().unwrap_err(), "termination_reason");
    }

    /// An empty reason is rejected the same way by `transition` and by decoding.
    #[test]
    fn empty_termination_reason_is_rejected_on_decode() {
        let text = r#"{"run_id":"r1","agent_version":"1.0","llm":"gpt-x","created_at":1000.0,"status":"success","termination_reason":""}"#;
        assert_validation(RunMeta::from_json(text).unwrap_err(), "termination_reason");

        let mut meta = sample_run();
        meta.status = RunStatus::Stopped;
        meta.termination_reason = Some(String::new());
        assert_validation(meta.validate().unwrap_err(), "termination_reason");

        meta.termination_reason = Some("operator stop".to_string());
        meta.validate().unwrap();
    }

    // ── AgentStep ────────────────────────────────────────────────────────────

    #[test]
    fn agent_step_new_applies_defaults() {
        let step = AgentStep::new(
            0,
            1000.5,
            StepPhase::Reason,
            payload(json!({ "prompt": "hi" })),
            payload(json!({ "text": "hello" })),
        )
        .unwrap();

        assert_eq!(step.step_id(), 0);
        assert_eq!(step.timestamp(), 1000.5);
        assert_eq!(step.phase(), StepPhase::Reason);
        assert_eq!(step.input().get("prompt"), Some(&json!("hi")));
        assert_eq!(step.output().get("text"), Some(&json!("hello")));
        assert_eq!(step.status(), StepStatus::Ok);
        assert_eq!(step.state_ref(), None);
        assert_eq!(step.diff_ref(), None);
    }

    #[test]
    fn agent_step_setters_keep_supplied_values() {
        let step = AgentStep::new(3, 7.25, StepPhase::Tool, Payload::new(), Payload::new())
            .unwrap()
            .with_status(StepStatus::Retry)
            .with_state_ref("sha256:abc")
            .with_diff_ref("diff-3");

        assert_eq!(step.status(), StepStatus::Retry);
        assert_eq!(step.state_ref(), Some("sha256:abc"));
        assert_eq!(step.diff_ref(), Some("diff-3"));
    }

    #[test]
    fn step_phase_rejects_unknown_strings() {
        for bad in ["", "plan", "Reason", "tools", "act"] {
            assert_validation(bad.parse::<StepPhase>().unwrap_err(), "phase");
        }
        for phase in StepPhase::ALL {
            assert_eq!(phase.as_str().parse::<StepPhase>().unwrap(), phase);
        }
    }

    #[test]
    fn step_status_rejects_unknown_strings() {
        for bad in ["", "OK", "failed", "pending"] {
            assert_validation(bad.parse::<StepStatus>().unwrap_err(), "status");
        }
        for status in StepStatus::ALL {
            assert_eq!(status.as_str().parse::<StepStatus>().unwrap(), status);
            assert_eq!(status.to_string(), status.as_str());
        }
    }

    #[test]
    fn agent_step_decode_rejects_invalid_fields() {
        let bad_phase = r#"{"step_id":0,"timestamp":1.0,"phase":"plan","input":{},"output":{}}"#;
        assert!(matches!(
            AgentStep::from_json(bad_phase).unwrap_err(),
            TraceError::Validation { .. }
        ));

        let bad_status =
            r#"{"step_id":0,"timestamp":1.0,"phase":"tool","input":{},"output":{},"status":"done"}"#;
        assert!(matches!(
            AgentStep::from_json(bad_status).unwrap_err(),
            TraceError::Validation { .. }
        ));

        let negative_id = r#"{"step_id":-1,"timestamp":1.0,"phase":"tool","input":{},"output":{}}"#;
        assert!(matches!(
            AgentStep::from_json(negative_id).unwrap_err(),
            TraceError::Validation { .. }
        ));
    }

    #[test]
    fn agent_step_rejects_non_finite_timestamp() {
        let err = AgentStep::new(0, f64::INFINITY, StepPhase::Memory, Payload::new(), Payload::new())
            .unwrap_err();
        assert_validation(err, "timestamp");
    }

    // ── JSON round-trip ──────────────────────────────────────────────────────

    #[test]
    fn run_meta_round_trips() {
        let mut original = RunMeta::new("run-7", "0.3.1", "claude-like", 1_718_000_000.123_456)
            .unwrap()
            .with_tools(["shell", "editor"])
            .with_seed(-17)
            .with_temperature(0.35)
            .unwrap();
        original.step_count = 12;
        original.truncated = true;
        original.transition(RunStatus::Exhausted, "step budget used up").unwrap();

        let decoded = RunMeta::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(original, decoded);

        let decoded = RunMeta::from_json(&original.to_json_pretty().unwrap()).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn agent_step_round_trips_nested_payloads() {
        let original = AgentStep::new(
            4,
            1_718_000_000.987_654_3,
            StepPhase::Observe,
            payload(json!({
                "call": { "tool": "search", "args": { "q": "rust", "limit": 5 } },
                "history": [1, 2.5, "three", null, true, { "deep": [[]] }],
            })),
            payload(json!({ "results": [], "latency_ms": 12.75, "note": null })),
        )
        .unwrap()
        .with_status(StepStatus::Error)
        .with_state_ref("sha256:00ff")
        .with_diff_ref("diff/4");

        let decoded = AgentStep::from_json(&original.to_json().unwrap()).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn enums_use_lowercase_wire_names() {
        let step = AgentStep::new(1, 2.0, StepPhase::Terminate, Payload::new(), Payload::new())
            .unwrap()
            .with_status(StepStatus::Retry);
        let value: Value = serde_json::from_str(&step.to_json().unwrap()).unwrap();

        assert_eq!(value["phase"], json!("terminate"));
        assert_eq!(value["status"], json!("retry"));
        assert_eq!(value["state_ref"], Value::Null);
    }

    // ── Clock ────────────────────────────────────────────────────────────────

    #[test]
    fn now_secs_is_after_2020() {
        assert!(clock::now_secs() > 1_577_836_800.0);
    }

    // ── TraceError display messages ──────────────────────────────────────────

    #[test]
    fn error_display_messages() {
        let msg = TraceError::validation("run_id", "must not be empty").to_string();
        assert!(msg.contains("run_id"));
        assert!(msg.contains("must not be empty"));

        let msg = TraceError::InvalidTransition {
            from: "success".to_string(),
            to: "failure".to_string(),
        }
        .to_string();
        assert!(msg.contains("success"));
        assert!(msg.contains("failure"));

        let msg = TraceError::RunClosed {
            run_id: "r1".to_string(),
        }
        .to_string();
        assert!(msg.contains("r1"));
    }
}
