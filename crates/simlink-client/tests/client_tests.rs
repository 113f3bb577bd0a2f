//! End-to-end tests driving `SimClient` through the in-memory transport

use std::time::Duration;

use simlink_client::prelude::*;
use simlink_client::{Command, DefineId};
use simlink_simvars::{
    airspeed_indicated, gear_handle_position, input_events, plane_altitude,
    plane_heading_degrees_true, sim_on_ground, system_events,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

const WAIT: Duration = Duration::from_secs(2);

async fn connect() -> Result<(MemoryTransport, SimClient), Box<dyn std::error::Error>> {
    let transport = MemoryTransport::new();
    let config = ClientConfig::default()
        .with_application_name("client-tests")
        .with_poll_interval(Duration::from_millis(2));
    let client = SimClient::connect(transport.clone(), config).await?;
    client.wait_until_open(WAIT).await?;
    Ok((transport, client))
}

fn data(define_id: DefineId, define_count: u32, payload: &[u8]) -> Vec<u8> {
    SimObjectDataRecord {
        request_id: define_id.0,
        object_id: ObjectId::USER,
        define_id,
        flags: 0,
        entry_number: 0,
        out_of: 0,
        define_count,
        data: payload,
    }
    .encode()
}

fn event(event_id: EventId, data: u32) -> Vec<u8> {
    EventRecord {
        group_id: 0,
        event_id,
        data,
    }
    .encode()
}

fn request_count(transport: &MemoryTransport, define_id: DefineId) -> usize {
    transport
        .sent_commands()
        .iter()
        .filter(|c| matches!(c, Command::RequestData { define_id: id, .. } if *id == define_id))
        .count()
}

async fn drained(transport: &MemoryTransport) -> TestResult {
    tokio::time::timeout(WAIT, async {
        while transport.pending_notifications() > 0 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await?;
    // One more cycle so the last notification finishes dispatching.
    tokio::time::sleep(Duration::from_millis(20)).await;
    Ok(())
}

#[tokio::test]
async fn test_connection_confirmed_by_open_record() -> TestResult {
    let (transport, client) = connect().await?;
    assert_eq!(transport.application_name().as_deref(), Some("client-tests"));
    assert!(matches!(
        client.connection_state(),
        ConnectionState::Open(info) if info.application_name == MemoryTransport::SIMULATOR_NAME
    ));
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_wait_until_open_times_out_without_open_record() -> TestResult {
    let transport = MemoryTransport::new().without_open_record();
    let config = ClientConfig::default().with_poll_interval(Duration::from_millis(2));
    let client = SimClient::connect(transport, config).await?;
    let result = client.wait_until_open(Duration::from_millis(30)).await;
    assert!(matches!(result, Err(ClientError::Timeout { .. })));
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_open_failure_is_returned() {
    let transport = MemoryTransport::new();
    transport.fail_open("simulator not running");
    let result = SimClient::connect(transport, ClientConfig::default()).await;
    assert!(matches!(
        result,
        Err(ClientError::Transport(TransportError::Open(_)))
    ));
}

#[tokio::test]
async fn test_altitude_subscription_delivers_and_renews() -> TestResult {
    let (transport, client) = connect().await?;
    let mut stream = client.subscribe_variables(vec![plane_altitude()]).await?;
    assert_eq!(stream.define_id(), DefineId(0));
    assert_eq!(request_count(&transport, DefineId(0)), 1);

    transport.push_notification(data(DefineId(0), 1, &encode_f64(10000.0)));
    let batch = tokio::time::timeout(WAIT, stream.recv())
        .await?
        .ok_or("stream ended")?;

    assert_eq!(batch.len(), 1);
    assert_eq!(batch[0].name(), "PLANE ALTITUDE");
    assert!((batch[0].as_f64()? - 10000.0).abs() < f64::EPSILON);

    drained(&transport).await?;
    assert_eq!(request_count(&transport, DefineId(0)), 2);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_periodic_subscription_is_not_renewed() -> TestResult {
    let (transport, client) = connect().await?;
    let options = SubscriptionOptions::default().period(RequestPeriod::SimFrame);
    let mut stream = client
        .subscribe_variables_with(vec![airspeed_indicated()], options)
        .await?;

    for speed in [120.0, 121.0, 122.0] {
        transport.push_notification(data(stream.define_id(), 1, &encode_f64(speed)));
    }
    for expected in [120.0, 121.0, 122.0] {
        let batch = tokio::time::timeout(WAIT, stream.recv())
            .await?
            .ok_or("stream ended")?;
        assert!((batch[0].as_f64()? - expected).abs() < f64::EPSILON);
    }

    assert_eq!(request_count(&transport, stream.define_id()), 1);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_bool_and_feet_batch() -> TestResult {
    let (transport, client) = connect().await?;
    let mut stream = client
        .subscribe_variables(vec![sim_on_ground(), plane_altitude()])
        .await?;

    let mut payload = encode_i32(1).to_vec();
    payload.extend_from_slice(&encode_f64(3500.0));
    transport.push_notification(data(stream.define_id(), 2, &payload));

    let batch = tokio::time::timeout(WAIT, stream.recv())
        .await?
        .ok_or("stream ended")?;
    assert!(batch[0].as_bool()?);
    assert!((batch[1].as_f64()? - 3500.0).abs() < f64::EPSILON);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_rejected_variable_is_left_out() -> TestResult {
    let (transport, client) = connect().await?;
    transport.reject_variable("NOT A SIMVAR");

    let stream = client
        .subscribe_variables(vec![
            plane_altitude(),
            VariableDescriptor::new("NOT A SIMVAR", "Feet"),
            airspeed_indicated(),
        ])
        .await?;
    let names: Vec<&str> = stream.variables().iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["PLANE ALTITUDE", "AIRSPEED INDICATED"]);
    assert_eq!(stream.accepted(), &[0, 2]);

    let result = client
        .subscribe_variables(vec![VariableDescriptor::new("NOT A SIMVAR", "Feet")])
        .await;
    assert!(matches!(result, Err(ClientError::EmptyDefinition { .. })));
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_bad_notifications_do_not_disturb_other_subscriptions() -> TestResult {
    let (transport, client) = connect().await?;
    let mut altitude = client.subscribe_variables(vec![plane_altitude()]).await?;
    let mut pair = client
        .subscribe_variables(vec![airspeed_indicated(), plane_altitude()])
        .await?;

    // Unknown definition, count mismatch and a truncated payload.
    transport.push_notification(data(DefineId(5), 1, &encode_f64(1.0)));
    transport.push_notification(data(altitude.define_id(), 2, &[0u8; 16]));
    transport.push_notification(data(pair.define_id(), 2, &[0u8; 14]));
    transport.push_notification(data(altitude.define_id(), 1, &encode_f64(9000.0)));

    let batch = tokio::time::timeout(WAIT, altitude.recv())
        .await?
        .ok_or("stream ended")?;
    assert!((batch[0].as_f64()? - 9000.0).abs() < f64::EPSILON);
    assert!(pair.try_recv().is_none());

    let stats = client.stats();
    assert_eq!(stats.unknown_definitions, 1);
    assert_eq!(stats.decode_failures, 2);
    assert_eq!(stats.batches_delivered, 1);

    // Mismatched and truncated payloads still renew their one-shot requests.
    drained(&transport).await?;
    assert_eq!(request_count(&transport, pair.define_id()), 2);
    assert_eq!(request_count(&transport, altitude.define_id()), 3);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_slow_consumer_loses_batches_but_loop_continues() -> TestResult {
    let transport = MemoryTransport::new();
    let config = ClientConfig::default()
        .with_poll_interval(Duration::from_millis(2))
        .with_data_channel_capacity(1)
        .with_request_period(RequestPeriod::SimFrame);
    let client = SimClient::connect(transport.clone(), config).await?;
    client.wait_until_open(WAIT).await?;

    let mut slow = client.subscribe_variables(vec![plane_altitude()]).await?;
    let mut events = client.subscribe_event(system_events::PAUSED).await?;

    for altitude in [1.0, 2.0, 3.0] {
        transport.push_notification(data(slow.define_id(), 1, &encode_f64(altitude)));
    }
    transport.push_notification(event(events.event_id(), 1));

    let paused = tokio::time::timeout(WAIT, events.recv())
        .await?
        .ok_or("event stream ended")?;
    assert!(paused.as_bool());

    let stats = client.stats();
    assert_eq!(stats.batches_delivered, 1);
    assert_eq!(stats.batches_dropped, 2);
    assert!(slow.try_recv().is_some());
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_paused_event_stream() -> TestResult {
    let (transport, client) = connect().await?;
    let mut paused = client.subscribe_event(system_events::PAUSED).await?;
    assert!(transport.sent_commands().iter().any(|c| matches!(
        c,
        Command::SubscribeSystemEvent { event_id, name }
            if *event_id == paused.event_id() && name == "Paused"
    )));

    transport.push_notification(event(paused.event_id(), 1));
    transport.push_notification(event(paused.event_id(), 0));

    let first = tokio::time::timeout(WAIT, paused.recv())
        .await?
        .ok_or("event stream ended")?;
    let second = tokio::time::timeout(WAIT, paused.recv())
        .await?
        .ok_or("event stream ended")?;
    assert!(first.as_bool());
    assert!(!second.as_bool());
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_event_callback_runs_for_each_occurrence() -> TestResult {
    let (transport, client) = connect().await?;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let event_id = client
        .on_event(system_events::CRASHED, move |n| {
            let _ = tx.send(n.data);
        })
        .await?;

    transport.push_notification(event(event_id, 7));
    transport.push_notification(event(event_id, 8));

    let first = tokio::time::timeout(WAIT, rx.recv()).await?;
    let second = tokio::time::timeout(WAIT, rx.recv()).await?;
    assert_eq!((first, second), (Some(7), Some(8)));
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_panicking_callback_keeps_connection_serving() -> TestResult {
    let (transport, client) = connect().await?;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let event_id = client
        .on_event(system_events::CRASHED, move |n| {
            if n.data == 0 {
                panic!("crash handler failed");
            }
            let _ = tx.send(n.data);
        })
        .await?;

    transport.push_notification(event(event_id, 0));
    transport.push_notification(event(event_id, 5));
    let delivered = tokio::time::timeout(WAIT, rx.recv()).await?;
    assert_eq!(delivered, Some(5));

    assert!(matches!(client.connection_state(), ConnectionState::Open(_)));
    assert!(transport.is_open());
    let stats = client.stats();
    assert_eq!(stats.callback_panics, 1);
    assert_eq!(stats.events_delivered, 1);

    // Subscriptions made after the panic are still served.
    let mut altitude = client.subscribe_variables(vec![plane_altitude()]).await?;
    transport.push_notification(data(altitude.define_id(), 1, &encode_f64(1200.0)));
    let batch = tokio::time::timeout(WAIT, altitude.recv())
        .await?
        .ok_or("stream ended")?;
    assert_eq!(batch.len(), 1);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_dropped_event_stream_is_retired() -> TestResult {
    let (transport, client) = connect().await?;
    let paused = client.subscribe_event(system_events::PAUSED).await?;
    let event_id = paused.event_id();
    drop(paused);

    transport.push_notification(event(event_id, 1));
    transport.push_notification(event(event_id, 0));
    drained(&transport).await?;

    let stats = client.stats();
    assert_eq!(stats.events_delivered, 0);
    assert_eq!(stats.events_unclaimed, 2);

    // The retired id is not handed out again.
    let next = client.subscribe_event(system_events::UNPAUSED).await?;
    assert_ne!(next.event_id(), event_id);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_filename_event() -> TestResult {
    let (transport, client) = connect().await?;
    let mut loaded = client.subscribe_event(system_events::FLIGHT_LOADED).await?;
    transport.push_notification(
        EventFilenameRecord {
            event: EventRecord {
                group_id: 0,
                event_id: loaded.event_id(),
                data: 0,
            },
            filename: "Missions/pattern.FLT".to_string(),
            flags: 0,
        }
        .encode(),
    );

    let occurrence = tokio::time::timeout(WAIT, loaded.recv())
        .await?
        .ok_or("event stream ended")?;
    assert_eq!(occurrence.filename.as_deref(), Some("Missions/pattern.FLT"));
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_unclaimed_event_is_counted() -> TestResult {
    let (transport, client) = connect().await?;
    transport.push_notification(event(EventId(42), 1));
    drained(&transport).await?;
    assert_eq!(client.stats().events_unclaimed, 1);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_write_uses_ephemeral_float_schema() -> TestResult {
    let (transport, client) = connect().await?;
    client.set_variable(&gear_handle_position(), 1.0).await?;

    let writes: Vec<Command> = transport
        .sent_commands()
        .into_iter()
        .filter(|c| {
            matches!(
                c,
                Command::AddToDefinition { define_id, .. }
                    | Command::SetData { define_id, .. }
                    | Command::ClearDefinition { define_id }
                    if *define_id == DefineId::EPHEMERAL_WRITE
            )
        })
        .collect();

    assert_eq!(writes.len(), 3);
    assert!(matches!(
        &writes[0],
        Command::AddToDefinition { name, datum: DatumKind::Float64, .. } if name == "GEAR HANDLE POSITION"
    ));
    assert!(matches!(
        &writes[1],
        Command::SetData { data, object_id: ObjectId::USER, .. } if data.as_slice() == encode_f64(1.0)
    ));
    assert!(matches!(&writes[2], Command::ClearDefinition { .. }));
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_write_degrees_sends_radians() -> TestResult {
    let (transport, client) = connect().await?;
    client
        .set_variable_degrees(&plane_heading_degrees_true(), 180.0)
        .await?;

    let sent = transport.sent_commands();
    let payload = sent
        .iter()
        .find_map(|c| match c {
            Command::SetData { data, .. } => Some(data.clone()),
            _ => None,
        })
        .ok_or("no write sent")?;
    assert!((decode_f64(&payload)? - std::f64::consts::PI).abs() < 1e-12);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_transmit_event_completion() -> TestResult {
    let (transport, client) = connect().await?;
    let completion = client
        .transmit_event(input_events::PARKING_BRAKES, 0)
        .await?;
    let event_id = completion.event_id();
    assert!(transport.sent_commands().iter().any(|c| matches!(
        c,
        Command::TransmitEvent { event_id: id, name, .. }
            if *id == event_id && name == "PARKING_BRAKES"
    )));

    transport.push_notification(event(event_id, 0));
    let fired = completion.wait(WAIT).await?;
    assert_eq!(fired.event_id, event_id);

    // A second occurrence finds the one-shot already used.
    transport.push_notification(event(event_id, 0));
    drained(&transport).await?;
    assert_eq!(client.stats().events_unclaimed, 1);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_show_text_completion() -> TestResult {
    let (transport, client) = connect().await?;
    let completion = client
        .show_text(
            TextKind::Print(TextColor::Green),
            "Gear down",
            Duration::from_secs(3),
        )
        .await?;

    let sent = transport.sent_commands();
    let text = sent
        .iter()
        .find_map(|c| match c {
            Command::ShowText { text, .. } => Some(text.clone()),
            _ => None,
        })
        .ok_or("no text command")?;
    assert_eq!(text, b"Gear down\0");

    transport.push_notification(event(completion.event_id(), 0));
    completion.wait(WAIT).await?;
    client.close().await?;
    Ok(())
}

#[derive(Debug)]
struct Approach {
    altitude: f64,
    on_ground: bool,
}

impl FromRecord for Approach {
    fn mapping() -> RecordMapping {
        RecordMapping::builder()
            .describe_variable("altitude", plane_altitude())
            .describe_variable("on_ground", sim_on_ground())
            .build()
            .unwrap_or_default()
    }

    fn from_record(record: &MappedRecord) -> ClientResult<Self> {
        Ok(Self {
            altitude: record.f64("altitude")?,
            on_ground: record.bool("on_ground")?,
        })
    }
}

#[tokio::test]
async fn test_record_mapping_subscription() -> TestResult {
    let (transport, client) = connect().await?;
    let mut records = client.subscribe_as::<Approach>().await?;
    assert_eq!(records.fields(), &["altitude".to_string(), "on_ground".to_string()]);

    let mut payload = encode_f64(1200.0).to_vec();
    payload.extend_from_slice(&encode_i32(0));
    transport.push_notification(data(records.define_id(), 2, &payload));

    let approach = tokio::time::timeout(WAIT, records.recv_as::<Approach>())
        .await?
        .ok_or("record stream ended")??;
    assert!((approach.altitude - 1200.0).abs() < f64::EPSILON);
    assert!(!approach.on_ground);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_record_mapping_with_rejected_field() -> TestResult {
    let (transport, client) = connect().await?;
    transport.reject_variable("SIM ON GROUND");
    let mut records = client.subscribe_record(Approach::mapping()).await?;
    assert_eq!(records.fields(), &["altitude".to_string()]);

    transport.push_notification(data(records.define_id(), 1, &encode_f64(800.0)));
    let record = tokio::time::timeout(WAIT, records.recv())
        .await?
        .ok_or("record stream ended")?;
    assert!((record.f64("altitude")? - 800.0).abs() < f64::EPSILON);
    assert!(record.get("on_ground").is_none());
    assert!(matches!(
        record.decode::<Approach>(),
        Err(ClientError::Mapping(_))
    ));
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_dropped_stream_stops_renewal() -> TestResult {
    let (transport, client) = connect().await?;
    let stream = client.subscribe_variables(vec![plane_altitude()]).await?;
    let define_id = stream.define_id();
    drop(stream);

    transport.push_notification(data(define_id, 1, &encode_f64(1.0)));
    drained(&transport).await?;
    assert_eq!(request_count(&transport, define_id), 1);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_exceptions_are_broadcast_not_delivered() -> TestResult {
    let (transport, client) = connect().await?;
    let mut exceptions = client.subscribe_exceptions();
    let mut stream = client.subscribe_variables(vec![plane_altitude()]).await?;

    let record = ExceptionRecord {
        exception: ExceptionCode(3),
        send_id: 11,
        index: 0,
    };
    transport.push_notification(record.encode());

    let observed = tokio::time::timeout(WAIT, exceptions.recv()).await??;
    assert_eq!(observed, record);
    assert!(stream.try_recv().is_none());
    assert_eq!(client.stats().exceptions, 1);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_poll_errors_are_recovered() -> TestResult {
    let (transport, client) = connect().await?;
    let mut stream = client.subscribe_variables(vec![plane_altitude()]).await?;
    transport.inject_poll_errors(3);
    transport.push_notification(data(stream.define_id(), 1, &encode_f64(500.0)));

    let batch = tokio::time::timeout(WAIT, stream.recv())
        .await?
        .ok_or("stream ended")?;
    assert!((batch[0].as_f64()? - 500.0).abs() < f64::EPSILON);
    assert_eq!(client.stats().poll_errors, 3);
    client.close().await?;
    Ok(())
}

#[tokio::test]
async fn test_quit_then_close() -> TestResult {
    let (transport, client) = connect().await?;
    let mut state = client.watch_state();
    transport.push_notification(encode_empty(RecordKind::Quit));

    tokio::time::timeout(WAIT, state.wait_for(|s| *s == ConnectionState::Quit)).await??;
    client.close().await?;
    assert_eq!(client.connection_state(), ConnectionState::Closed);
    assert!(!transport.is_open());
    Ok(())
}

#[tokio::test]
async fn test_external_close_ends_loop() -> TestResult {
    let (transport, client) = connect().await?;
    let mut stream = client.subscribe_variables(vec![plane_altitude()]).await?;
    transport.close().await?;

    let mut state = client.watch_state();
    tokio::time::timeout(WAIT, state.wait_for(|s| *s == ConnectionState::Closed)).await??;
    assert!(matches!(
        client.subscribe_event(system_events::PAUSED).await,
        Err(ClientError::Closed)
    ));
    drop(state);

    client.close().await?;
    drop(client);
    // Every sender is gone once the client is dropped.
    assert!(tokio::time::timeout(WAIT, stream.recv()).await?.is_none());
    Ok(())
}
