//! Integration tests driving real loopback sockets through
//! `MioEventLoop`, mirroring the concrete scenarios in the buffer/read
//! engine design (prefix merging is covered at the unit level in
//! `src/buffer.rs`; these exercise the engine around it).

#[path = "support.rs"]
mod support;

use std::cell::RefCell;
use std::io::Write as _;
use std::net::TcpListener;
use std::rc::{Rc, Weak};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use mio::net::TcpStream as MioTcpStream;
use readypipe::io_loop::IoLoop;
use readypipe::{MioEventLoop, Stream, StreamConfig, Transport};

/// Spawns a loopback listener, accepts exactly one connection on a
/// background thread (driven with blocking std sockets, since the test's
/// job is to drive the crate's side non-blocking, not the peer's), and
/// returns a `Stream` wrapping the client half plus a join handle the
/// caller can use to hand the peer socket write/shutdown instructions.
fn connected_pair(event_loop: &Rc<MioEventLoop>) -> (Rc<RefCell<Stream>>, std::net::TcpStream) {
    connected_pair_with_config(event_loop, StreamConfig::default())
}

fn connected_pair_with_config(
    event_loop: &Rc<MioEventLoop>,
    config: StreamConfig,
) -> (Rc<RefCell<Stream>>, std::net::TcpStream) {
    let port = support::next_available_port();
    let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
    let client = MioTcpStream::connect(format!("127.0.0.1:{}", port).parse().unwrap()).unwrap();
    let (peer, _) = listener.accept().unwrap();
    peer.set_nonblocking(false).unwrap();

    let weak: Weak<dyn IoLoop> = Rc::downgrade(event_loop);
    let stream = Stream::new(Transport::Plain(client), weak, config);
    (stream, peer)
}

fn pump(event_loop: &MioEventLoop, turns: usize) {
    for _ in 0..turns {
        event_loop.run_once(Some(Duration::from_millis(50))).unwrap();
    }
}

#[test]
fn delimiter_split_across_chunks() {
    support::setup_logger();
    let event_loop = Rc::new(MioEventLoop::new(16).unwrap());
    let (stream, mut peer) = connected_pair(&event_loop);

    let received: Rc<RefCell<Option<Bytes>>> = Rc::new(RefCell::new(None));
    let received_clone = Rc::clone(&received);
    stream
        .borrow_mut()
        .read_until(Bytes::from_static(b"\r\n"), Box::new(move |payload| {
            *received_clone.borrow_mut() = Some(payload);
        }))
        .unwrap();

    peer.write_all(b"foo\r").unwrap();
    peer.flush().unwrap();
    pump(&event_loop, 4);
    assert!(received.borrow().is_none(), "must not fire before the delimiter is complete");

    peer.write_all(b"\nbar").unwrap();
    peer.flush().unwrap();
    pump(&event_loop, 4);

    let payload = received.borrow_mut().take().expect("callback should have fired");
    assert_eq!(&payload[..], b"foo\r\n");
}

#[test]
fn exact_count_with_streaming_and_until_close_on_leftover() {
    support::setup_logger();
    let event_loop = Rc::new(MioEventLoop::new(16).unwrap());
    let (stream, mut peer) = connected_pair(&event_loop);

    let streamed: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let done = Rc::new(RefCell::new(None::<Bytes>));

    let streamed_clone = Rc::clone(&streamed);
    let done_clone = Rc::clone(&done);
    stream
        .borrow_mut()
        .read_bytes(
            4,
            Box::new(move |payload| *done_clone.borrow_mut() = Some(payload)),
            Some(Box::new(move |chunk| streamed_clone.borrow_mut().extend_from_slice(&chunk))),
        )
        .unwrap();

    peer.write_all(b"tailmore").unwrap();
    peer.flush().unwrap();
    pump(&event_loop, 4);

    assert_eq!(&streamed.borrow()[..], b"tail");
    assert_eq!(done.borrow_mut().take().expect("read_bytes should complete"), Bytes::new());

    // "more" is left buffered, unconsumed by the completed exact-count read.
    peer.shutdown(std::net::Shutdown::Write).unwrap();
    pump(&event_loop, 4);
    assert!(stream.borrow().closed(), "remote EOF should close the stream");

    let tail = Rc::new(RefCell::new(None::<Bytes>));
    let tail_clone = Rc::clone(&tail);
    stream
        .borrow_mut()
        .read_until_close(Box::new(move |payload| *tail_clone.borrow_mut() = Some(payload)), None)
        .unwrap();
    // Delivered on the loop's next turn, not synchronously inline.
    assert!(tail.borrow().is_none());
    pump(&event_loop, 2);
    assert_eq!(tail.borrow_mut().take().unwrap(), Bytes::from_static(b"more"));
}

#[test]
fn buffer_overflow_closes_the_stream() {
    support::setup_logger();
    let event_loop = Rc::new(MioEventLoop::new(16).unwrap());
    let (stream, mut peer) = connected_pair_with_config(&event_loop, StreamConfig::new(8, 4096));

    let completed = Rc::new(RefCell::new(false));
    let completed_clone = Rc::clone(&completed);
    stream
        .borrow_mut()
        .read_bytes(1000, Box::new(move |_payload| *completed_clone.borrow_mut() = true), None)
        .unwrap();

    peer.write_all(&[0u8; 10]).unwrap();
    peer.flush().unwrap();
    pump(&event_loop, 4);

    assert!(stream.borrow().closed());
    assert!(!*completed.borrow(), "overflow must close, not complete, the read");
    assert!(matches!(
        stream.borrow().error(),
        Some(readypipe::StreamError::BufferOverflow { .. })
    ));
}

#[test]
fn double_read_is_rejected() {
    support::setup_logger();
    let event_loop = Rc::new(MioEventLoop::new(16).unwrap());
    let (stream, _peer) = connected_pair(&event_loop);

    stream.borrow_mut().read_bytes(4, Box::new(|_| {}), None).unwrap();
    let second = stream.borrow_mut().read_bytes(4, Box::new(|_| {}), None);
    assert!(matches!(second, Err(readypipe::StreamError::DoubleRead)));
}

#[test]
fn write_then_write_delivers_in_order() {
    support::setup_logger();
    let event_loop = Rc::new(MioEventLoop::new(16).unwrap());
    let (stream, mut peer) = connected_pair(&event_loop);

    stream.borrow_mut().write(Bytes::from_static(b"hello, "), None).unwrap();
    stream.borrow_mut().write(Bytes::from_static(b"world"), None).unwrap();
    pump(&event_loop, 4);

    let mut buf = [0u8; 32];
    thread::sleep(Duration::from_millis(20));
    peer.set_nonblocking(true).unwrap();
    let n = {
        use std::io::Read;
        peer.read(&mut buf).unwrap()
    };
    assert_eq!(&buf[..n], b"hello, world");
}
