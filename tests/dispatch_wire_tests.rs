use daqrecon::dispatch::{Block, BlockProducer, BlockSink, BlockSource, OrderedReceiver, WireSink, WireSource};
use daqrecon::Error;
use std::io::Cursor;

#[test]
fn test_one_json_line_per_block() {
    let sink: WireSink<Vec<u8>, Block<u32>> = WireSink::new(Vec::new());
    sink.push(Block::Data { sequence: 0, items: vec![1, 2] }).unwrap();
    sink.push(Block::Sentinel { sequence: 1 }).unwrap();

    let text = String::from_utf8(sink.into_inner()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in lines {
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(value.is_object());
    }
}

#[test]
fn test_source_reads_back_and_reports_eof() {
    let mut bytes = Vec::new();
    let mut producer = BlockProducer::new(WireSink::new(&mut bytes), 2).unwrap();
    producer.push_all(0u32..5).unwrap();
    assert_eq!(producer.shutdown().unwrap(), 3);

    let source: WireSource<_, Block<u32>> = WireSource::new(Cursor::new(bytes));
    assert_eq!(source.pull().unwrap(), Block::Data { sequence: 0, items: vec![0, 1] });
    assert_eq!(source.pull().unwrap(), Block::Data { sequence: 1, items: vec![2, 3] });
    assert_eq!(source.pull().unwrap(), Block::Data { sequence: 2, items: vec![4] });
    assert_eq!(source.pull().unwrap(), Block::Sentinel { sequence: 3 });
    assert!(matches!(source.pull(), Err(Error::Disconnected)));
}

#[test]
fn test_blank_lines_are_skipped() {
    let input = "\n{\"Sentinel\":{\"sequence\":0}}\n\n";
    let source: WireSource<_, Block<u32>> = WireSource::new(Cursor::new(input));
    assert_eq!(source.pull().unwrap(), Block::Sentinel { sequence: 0 });
    assert!(matches!(source.pull(), Err(Error::Disconnected)));
}

#[test]
fn test_garbage_line_is_an_error() {
    let source: WireSource<_, Block<u32>> = WireSource::new(Cursor::new("not json\n"));
    assert!(matches!(source.pull(), Err(Error::Json(_))));
}

#[test]
fn test_ordering_over_shuffled_stream() {
    let lines = [
        r#"{"Data":{"sequence":1,"items":[3,4,5]}}"#,
        r#"{"Sentinel":{"sequence":2}}"#,
        r#"{"Data":{"sequence":0,"items":[0,1,2]}}"#,
    ];
    let source: WireSource<_, Block<u32>> = WireSource::new(Cursor::new(lines.join("\n")));
    let items = OrderedReceiver::new(source)
        .collect::<Result<Vec<u32>, _>>()
        .unwrap();
    assert_eq!(items, vec![0, 1, 2, 3, 4, 5]);
}

#[cfg(unix)]
#[test]
fn test_socket_pair_transport() {
    use std::os::unix::net::UnixStream;

    let (a, b) = UnixStream::pair().unwrap();
    let writer = std::thread::spawn(move || {
        let mut producer = BlockProducer::new(WireSink::new(a), 4).unwrap();
        producer.push_all(0u32..10).unwrap();
        producer.shutdown().unwrap()
    });

    let source: WireSource<_, Block<u32>> = WireSource::new(b);
    let items = OrderedReceiver::new(source)
        .collect::<Result<Vec<u32>, _>>()
        .unwrap();
    assert_eq!(items, (0..10).collect::<Vec<_>>());
    assert_eq!(writer.join().unwrap(), 3);
}
