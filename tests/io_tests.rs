use daqrecon::core::{Event, Pulse, RawPulse, TimeRange};
use daqrecon::io::{CollectingSink, EventSink, JsonLinesSink, MemoryPulseSource, PulseSource};
use daqrecon::Error;
use std::io::BufRead;

fn event(number: u64) -> Event {
    let range = TimeRange::new(100 * number as i64, 100 * number as i64 + 50).unwrap();
    let mut event = Event::shell(number, range, 10);
    event.pulses.push(Pulse::new(1, 2, vec![3, 4, 5]));
    event
}

#[test]
fn test_raw_pulse_samples() {
    let raw = RawPulse::from_samples(3, 120, &[1, -2, 300]);
    assert_eq!(raw.data.len(), 6);
    assert_eq!(raw.samples().unwrap(), vec![1, -2, 300]);

    let odd = RawPulse {
        channel: 0,
        time: 0,
        data: vec![1, 0, 7],
    };
    assert!(matches!(odd.samples(), Err(Error::LengthMismatch { .. })));
}

#[test]
fn test_pulse_placed_relative_to_event() {
    let raw = RawPulse::from_samples(2, 1_250, &[5, 6]);
    let pulse = Pulse::from_raw(&raw, 1_000, 10).unwrap();
    assert_eq!(pulse.channel, 2);
    assert_eq!(pulse.left, 25);
    assert_eq!(pulse.right(), 27);
    assert_eq!(pulse.raw_data, vec![5, 6]);

    assert!(matches!(
        Pulse::from_raw(&raw, 2_000, 10),
        Err(Error::PulseBeforeEvent { time: 1_250, event_start: 2_000 })
    ));
}

#[test]
fn test_summed_waveform() {
    let range = TimeRange::new(0, 40).unwrap();
    let mut event = Event::shell(0, range, 10);
    assert_eq!(event.length(), 5);
    event.pulses.push(Pulse::new(0, 1, vec![1, 1, 1]));
    event.pulses.push(Pulse::new(1, 2, vec![10, 10, 10, 10, 10]));

    // The second pulse runs past the event bounds and extends the waveform
    assert_eq!(
        event.summed_waveform(),
        vec![0.0, 1.0, 11.0, 11.0, 10.0, 10.0, 10.0]
    );
}

#[test]
fn test_invalid_time_range() {
    assert!(matches!(
        TimeRange::new(5, 4),
        Err(Error::InvalidRange { start: 5, stop: 4 })
    ));
    let range = TimeRange::new(0, 10).unwrap();
    assert!(range.contains(0) && range.contains(10) && !range.contains(11));
    assert!(range.overlaps(&TimeRange::new(10, 20).unwrap()));
    assert!(!range.overlaps(&TimeRange::new(11, 20).unwrap()));
}

#[tokio::test]
async fn test_memory_source_queries() {
    let source = MemoryPulseSource::new();
    source.append(vec![
        RawPulse::from_samples(0, 30, &[1]),
        RawPulse::from_samples(1, 10, &[1]),
        RawPulse::from_samples(2, 20, &[1]),
    ]);
    assert_eq!(source.len(), 3);
    assert!(!source.acquisition_ended().await.unwrap());

    assert_eq!(source.pulse_times_after(None).await.unwrap(), vec![10, 20, 30]);
    assert_eq!(source.pulse_times_after(Some(20)).await.unwrap(), vec![30]);
    assert!(source.pulse_times_after(Some(30)).await.unwrap().is_empty());

    let fetched = source
        .fetch_pulses(TimeRange::new(10, 20).unwrap())
        .await
        .unwrap();
    assert_eq!(fetched.iter().map(|p| p.channel).collect::<Vec<_>>(), vec![1, 2]);

    source.end_acquisition();
    assert!(source.acquisition_ended().await.unwrap());
}

#[tokio::test]
async fn test_collecting_sink() {
    let sink = CollectingSink::new();
    assert!(sink.is_empty());
    sink.write_event(&event(0)).await.unwrap();
    sink.write_event(&event(1)).await.unwrap();
    assert_eq!(sink.len(), 2);
    assert_eq!(sink.events()[1].event_number, 1);
}

#[tokio::test]
async fn test_jsonl_sink_writes_one_event_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");

    let sink = JsonLinesSink::create(&path).unwrap();
    for number in 0..3 {
        sink.write_event(&event(number)).await.unwrap();
    }
    sink.flush().unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let events: Vec<Event> = std::io::BufReader::new(file)
        .lines()
        .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
        .collect();
    assert_eq!(events.len(), 3);
    assert_eq!(events[2], event(2));
}

#[tokio::test]
async fn test_jsonl_sink_appends() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.jsonl");

    for number in 0..2 {
        let sink = JsonLinesSink::create(&path).unwrap();
        sink.write_event(&event(number)).await.unwrap();
        sink.flush().unwrap();
    }

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 2);
}

#[tokio::test]
async fn test_jsonl_sink_into_inner() {
    let sink = JsonLinesSink::new(Vec::new());
    sink.write_event(&event(4)).await.unwrap();
    let bytes = sink.into_inner().unwrap();
    let decoded: Event = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(decoded.event_number, 4);
    assert_eq!(decoded.pulses[0].raw_data, vec![3, 4, 5]);
}
