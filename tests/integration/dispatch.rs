//! End-to-end dispatch loop behavior over in-memory streams.

use std::collections::HashSet;

use crashcast::protocol::Listener;
use crashcast::publisher::Publisher;

use super::helpers::{delivery_log, frame, FailingSink, RecordingSink};

const STDERR_EVENT: &str = "PROCESS_LOG_STDERR";
const EXITED_EVENT: &str = "PROCESS_STATE_EXITED";

const CRASH_PAYLOAD: &str =
    "processname:worker1 groupname:web pid:4821\nTraceback (most recent call last):";

fn subscriptions(names: &[&str]) -> HashSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Run the dispatch loop over `input` with the given sinks registered, and
/// return the bytes the listener wrote to its output stream.
fn run_loop(
    input: &str,
    subs: HashSet<String>,
    sinks: Vec<Box<dyn crashcast::publisher::Sink>>,
) -> String {
    let mut out = Vec::new();
    {
        let listener = Listener::new(input.as_bytes(), &mut out);
        let mut publisher = Publisher::new(listener, subs);
        for sink in sinks {
            publisher.register(sink);
        }
        publisher.run_forever().expect("dispatch loop failed");
    }
    String::from_utf8(out).expect("listener wrote non-UTF-8 output")
}

#[test]
fn test_subscribed_crash_reaches_sinks_in_order() {
    let log = delivery_log();
    let output = run_loop(
        &frame(STDERR_EVENT, CRASH_PAYLOAD),
        subscriptions(&[STDERR_EVENT]),
        vec![
            Box::new(RecordingSink::new("chat", &log)),
            Box::new(RecordingSink::new("mail", &log)),
        ],
    );

    let deliveries = log.lock().unwrap();
    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0].0, "chat");
    assert_eq!(deliveries[1].0, "mail");

    // Both sinks saw the same record, normalized from the nested headers.
    let event = &deliveries[0].1;
    assert_eq!(event.process_name.as_deref(), Some("worker1"));
    assert_eq!(event.group_name.as_deref(), Some("web"));
    assert_eq!(event.pid.as_deref(), Some("4821"));
    assert!(event.detail_text.contains("Traceback (most recent call last):"));
    assert_eq!(deliveries[1].1, deliveries[0].1);

    // One full cycle: READY, ack, then the READY that observed EOF.
    assert_eq!(output, "READY\nRESULT 2\nOKREADY\n");
}

#[test]
fn test_unsubscribed_event_is_acknowledged_unread() {
    let log = delivery_log();
    let output = run_loop(
        &frame("PROCESS_COMMUNICATION_STDOUT", "whatever"),
        subscriptions(&[STDERR_EVENT]),
        vec![Box::new(RecordingSink::new("chat", &log))],
    );

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(output, "READY\nRESULT 2\nOKREADY\n");
}

#[test]
fn test_expected_exit_is_suppressed_but_acknowledged() {
    let log = delivery_log();
    let output = run_loop(
        &frame(
            EXITED_EVENT,
            "processname:cat groupname:cat from_state:RUNNING expected:1 pid:2766",
        ),
        subscriptions(&[EXITED_EVENT]),
        vec![Box::new(RecordingSink::new("chat", &log))],
    );

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(output, "READY\nRESULT 2\nOKREADY\n");
}

#[test]
fn test_unexpected_exit_is_delivered() {
    let log = delivery_log();
    run_loop(
        &frame(
            EXITED_EVENT,
            "processname:cat groupname:cat from_state:RUNNING expected:0 pid:2766",
        ),
        subscriptions(&[EXITED_EVENT]),
        vec![Box::new(RecordingSink::new("chat", &log))],
    );

    let deliveries = log.lock().unwrap();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].1.from_state.as_deref(), Some("RUNNING"));
    assert!(deliveries[0].1.detail_text.is_empty());
}

#[test]
fn test_failing_sink_does_not_block_later_sink_or_ack() {
    let log = delivery_log();
    let output = run_loop(
        &frame(STDERR_EVENT, CRASH_PAYLOAD),
        subscriptions(&[STDERR_EVENT]),
        vec![
            Box::new(FailingSink::new("broken", &log)),
            Box::new(RecordingSink::new("after", &log)),
        ],
    );

    let deliveries = log.lock().unwrap();
    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0].0, "broken");
    assert_eq!(deliveries[1].0, "after");

    // Exactly one acknowledgement despite the failure.
    assert_eq!(output, "READY\nRESULT 2\nOKREADY\n");
}

#[test]
fn test_register_then_remove_matches_never_registered() {
    let log = delivery_log();
    let input = frame(STDERR_EVENT, CRASH_PAYLOAD);

    let mut out = Vec::new();
    {
        let listener = Listener::new(input.as_bytes(), &mut out);
        let mut publisher = Publisher::new(listener, subscriptions(&[STDERR_EVENT]));
        publisher.register(Box::new(RecordingSink::new("ephemeral", &log)));
        publisher.remove("ephemeral");
        publisher.run_forever().expect("dispatch loop failed");
    }

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(String::from_utf8(out).unwrap(), "READY\nRESULT 2\nOKREADY\n");
}

#[test]
fn test_multiple_frames_each_get_one_ack() {
    let log = delivery_log();
    let input = format!(
        "{}{}{}",
        frame(STDERR_EVENT, CRASH_PAYLOAD),
        frame("PROCESS_COMMUNICATION_STDOUT", "ignored"),
        frame(STDERR_EVENT, "processname:worker2 groupname:web pid:4822\noops"),
    );

    let output = run_loop(
        &input,
        subscriptions(&[STDERR_EVENT]),
        vec![Box::new(RecordingSink::new("chat", &log))],
    );

    let deliveries = log.lock().unwrap();
    assert_eq!(deliveries.len(), 2);
    assert_eq!(deliveries[0].1.process_name.as_deref(), Some("worker1"));
    assert_eq!(deliveries[1].1.process_name.as_deref(), Some("worker2"));

    assert_eq!(
        output,
        "READY\nRESULT 2\nOKREADY\nRESULT 2\nOKREADY\nRESULT 2\nOKREADY\n"
    );
}

#[test]
fn test_clean_eof_returns_ok_without_deliveries() {
    let log = delivery_log();
    let output = run_loop(
        "",
        subscriptions(&[STDERR_EVENT]),
        vec![Box::new(RecordingSink::new("chat", &log))],
    );

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(output, "READY\n");
}

#[test]
fn test_malformed_frame_is_fatal_and_unacknowledged() {
    let log = delivery_log();
    let input = "eventname:PROCESS_LOG_STDERR\n";

    let mut out = Vec::new();
    let result = {
        let listener = Listener::new(input.as_bytes(), &mut out);
        let mut publisher = Publisher::new(listener, subscriptions(&[STDERR_EVENT]));
        publisher.register(Box::new(RecordingSink::new("chat", &log)));
        publisher.run_forever()
    };

    assert!(result.is_err());
    assert!(log.lock().unwrap().is_empty());
    // READY went out before the bad header line; no ack followed it.
    assert_eq!(String::from_utf8(out).unwrap(), "READY\n");
}
