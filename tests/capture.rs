use statsd_instrument::prelude::*;
use statsd_instrument::{Client, Datagram, DatagramValue, MetricType, SpyMetricSink};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Barrier};
use std::thread;

fn names(datagrams: &[Datagram]) -> Vec<&str> {
    datagrams.iter().map(Datagram::name).collect()
}

#[test]
fn test_nested_captures() {
    let client = Client::builder().build();
    let mut middle = Vec::new();
    let mut inner = Vec::new();

    client.increment("a").unwrap();
    let outer = client.capture(|| {
        client.increment("b").unwrap();
        middle = client.capture(|| {
            client.increment("c").unwrap();
            inner = client.capture(|| client.increment("d").unwrap());
        });
        client.increment("e").unwrap();
    });

    assert_eq!(vec!["b", "c", "d", "e"], names(&outer));
    assert_eq!(vec!["c", "d"], names(&middle));
    assert_eq!(vec!["d"], names(&inner));
}

#[test]
fn test_sibling_captures_are_isolated() {
    let client = Client::builder().build();

    let first = client.capture(|| client.increment("first").unwrap());
    let second = client.capture(|| client.increment("second").unwrap());

    assert_eq!(vec!["first"], names(&first));
    assert_eq!(vec!["second"], names(&second));
}

#[test]
fn test_captured_datagram_fields() {
    let client = Client::builder().with_prefix("app").build();
    let datagrams = client.capture(|| {
        client
            .distribution_with("render", 12.5)
            .with_tag("page", "home")
            .with_sample_rate(1.0)
            .send();
        client.event("deploy", "line one\nline two").unwrap();
    });

    assert_eq!(MetricType::Distribution, datagrams[0].metric_type());
    assert_eq!("app.render", datagrams[0].name());
    assert_eq!(&DatagramValue::Float(12.5), datagrams[0].value());
    assert_eq!(&["page:home".to_string()], datagrams[0].tags());

    assert_eq!(MetricType::Event, datagrams[1].metric_type());
    assert_eq!("app.deploy", datagrams[1].name());
    assert_eq!(&DatagramValue::Text("line one\nline two".to_string()), datagrams[1].value());
}

#[test]
fn test_capture_delivers_to_real_sink() {
    let (rx, sink) = SpyMetricSink::new();
    let client = Client::from_sink("", sink);

    let outer = client.capture(|| {
        let inner = client.capture(|| client.increment("foo").unwrap());
        assert_eq!(1, inner.len());
    });

    assert_eq!(1, outer.len());
    assert_eq!(vec!["foo:1|c".to_string()], rx.try_iter().collect::<Vec<_>>());
}

#[test]
fn test_panic_inside_nested_capture_restores_outer() {
    let client = Client::builder().build();

    let outer = client.capture(|| {
        let res = panic::catch_unwind(AssertUnwindSafe(|| {
            client.capture(|| {
                client.increment("lost").unwrap();
                panic!("boom");
            })
        }));
        assert!(res.is_err());
        client.increment("after").unwrap();
    });

    assert_eq!(vec!["lost", "after"], names(&outer));
    assert!(!client.is_capturing());
}

#[test]
fn test_captures_on_other_threads_do_not_interfere() {
    let client = Arc::new(Client::builder().build());
    let barrier = Arc::new(Barrier::new(4));

    let threads: Vec<_> = (0..4)
        .map(|i| {
            let client = Arc::clone(&client);
            let barrier = Arc::clone(&barrier);

            thread::spawn(move || {
                let key = format!("thread.{}", i);
                client.capture(|| {
                    barrier.wait();
                    for _ in 0..10 {
                        client.increment(&key).unwrap();
                    }
                    barrier.wait();
                })
                .into_iter()
                .map(|d| d.name().to_string())
                .collect::<Vec<_>>()
            })
        })
        .collect();

    for (i, t) in threads.into_iter().enumerate() {
        let got = t.join().unwrap();
        assert_eq!(vec![format!("thread.{}", i); 10], got);
    }
}

#[test]
fn test_capture_on_one_client_ignores_others() {
    let first = Client::builder().build();
    let second = Client::builder().build();

    let got = first.capture(|| {
        first.increment("mine").unwrap();
        second.increment("theirs").unwrap();
    });

    assert_eq!(vec!["mine"], names(&got));
}
