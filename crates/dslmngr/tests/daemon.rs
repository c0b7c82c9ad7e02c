use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use dslmngr::{Config, Daemon};
use dslmngr_bus::{BrokerListener, LoopInput, ServeOutcome, Status, CONTROL_REMOVE_OBJECT};
use dslmngr_netlink::parse_notification;
use dslmngr_xdsl::fake::FakeBackend;
use dslmngr_xdsl::Backend;
use serde_json::{json, Value};

fn make_sock_path(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/dslmngr-{}-{}-{}",
        tag,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir.join("bus.sock")
}

#[test]
fn serves_objects_forwards_events_and_withdraws() {
    let sock_path = make_sock_path("daemon");
    let listener = BrokerListener::bind(&sock_path).expect("broker should bind");
    let (calls_done, calls_seen) = mpsc::channel();

    let broker = thread::spawn(move || {
        let mut session = listener.accept().expect("broker should accept");
        let added: Vec<String> = (0..5)
            .map(|_| session.accept_object(Status::Ok).expect("add_object").name)
            .collect();
        assert_eq!(
            added,
            ["dsl", "dsl.line.0", "dsl.line.1", "dsl.channel.0", "xdsl"]
        );

        let reply = session
            .call(1, "dsl.line.1", "status", Value::Null)
            .expect("line status");
        assert_eq!(reply.status, Status::Ok);
        assert_eq!(reply.data.expect("line data")["firmware_version"], "fw-1");

        let reply = session
            .call(2, "dsl.channel.0", "stats", json!({"interval": "nope"}))
            .expect("channel stats");
        assert_eq!(reply.status, Status::InvalidArgument);

        let reply = session
            .call(3, "dsl", "status", Value::Null)
            .expect("aggregate status");
        let data = reply.data.expect("aggregate data");
        assert_eq!(data["line"].as_array().map(Vec::len), Some(2));

        let reply = session
            .call(4, "xdsl", "status", json!({"line": 5}))
            .expect("legacy status");
        assert_eq!(reply.status, Status::InvalidArgument);
        calls_done.send(()).expect("test thread waiting");

        let event = session.recv_event().expect("event");
        assert_eq!(event.event, "linkup");
        assert_eq!(event.data["line"], 0);

        (0..5)
            .map(|_| {
                let message = session.recv_control().expect("remove_object");
                assert_eq!(message.msg_type, CONTROL_REMOVE_OBJECT);
                message.object_name().expect("object name").to_string()
            })
            .collect::<Vec<_>>()
    });

    let fake = Arc::new(FakeBackend::with_lines(2, 1));
    let backend: Arc<dyn Backend> = fake.clone();
    let daemon = Daemon::start(&sock_path, &Config::default(), backend).expect("daemon should start");
    assert_eq!(daemon.object_names().len(), 5);

    let inputs = daemon.inputs();
    let serving = thread::spawn(move || daemon.serve());

    calls_seen.recv().expect("broker should finish its calls");
    let event = parse_notification("linkup '{\"line\":0}'").expect("notification should parse");
    inputs.send(event.into()).expect("loop should accept the event");
    inputs.send(LoopInput::Shutdown).expect("loop should accept shutdown");

    assert_eq!(serving.join().expect("serving thread"), ServeOutcome::Shutdown);
    let removed = broker.join().expect("broker thread");
    assert_eq!(
        removed,
        ["xdsl", "dsl.channel.0", "dsl.line.1", "dsl.line.0", "dsl"]
    );
    assert_eq!(fake.calls("get_channel_stats_interval"), 0);

    let _ = std::fs::remove_dir_all(sock_path.parent().expect("socket dir"));
}

#[test]
fn refused_registration_fails_startup() {
    let sock_path = make_sock_path("refused");
    let listener = BrokerListener::bind(&sock_path).expect("broker should bind");

    let broker = thread::spawn(move || {
        let mut session = listener.accept().expect("broker should accept");
        session.accept_object(Status::Ok).expect("dsl");
        let refused = session
            .accept_object(Status::PermissionDenied)
            .expect("dsl.line.0");
        assert_eq!(refused.name, "dsl.line.0");

        let message = session.recv_control().expect("rollback");
        assert_eq!(message.msg_type, CONTROL_REMOVE_OBJECT);
        assert_eq!(message.object_name(), Some("dsl"));
        session.ack("dsl", Status::Ok).expect("rollback ack");
    });

    let backend: Arc<dyn Backend> = Arc::new(FakeBackend::with_lines(1, 1));
    let err = Daemon::start(&sock_path, &Config::default(), backend)
        .err()
        .expect("registration should fail");
    assert_eq!(err.code, dslmngr::exit::FAILURE);
    assert!(err.message.contains("dsl.line.0"));

    broker.join().expect("broker thread");
    let _ = std::fs::remove_dir_all(sock_path.parent().expect("socket dir"));
}
