use super::*;
use crate::{App, Registry, RestartPolicy, app::terminate, config::ConsumerConfig};
use std::{io, sync::Mutex};
use tokio::time::Instant;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn app() -> App {
    App::with_policy(Duration::from_secs(1), RestartPolicy::default())
}

fn registry(tx: &mpsc::UnboundedSender<(&'static str, Message)>) -> Registry {
    let mut registry = Registry::new();
    registry
        .register("cat_created", recorder("created", tx))
        .unwrap()
        .register("cat_updated", recorder("updated", tx))
        .unwrap()
        .register("cat_deleted", recorder("deleted", tx))
        .unwrap();
    registry
}

#[rstest]
#[tokio::test]
async fn run_until_drives_cancellation(broker: Arc<MemoryBroker>) {
    let (tx, mut seen) = mpsc::unbounded_channel();
    let app = app();
    let signal = app.signal();
    app.launch(registry(&tx), Arc::clone(&broker)).await;

    broker.publish("cat_updated", "1", "{}");
    assert_eq!(next(&mut seen).await.0, "updated");

    let reports = timeout(WAIT, app.run_until(sleep(Duration::from_millis(20))))
        .await
        .unwrap();

    assert!(signal.is_cancelled());
    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.exit.is_cancelled()));
    for topic in ["cat_created", "cat_updated", "cat_deleted"] {
        assert_eq!(broker.released(topic), 1);
    }
}

#[rstest]
#[tokio::test]
async fn shutdown_only_once(broker: Arc<MemoryBroker>) {
    let (tx, _seen) = mpsc::unbounded_channel();
    let app = app();
    app.launch(registry(&tx), Arc::clone(&broker)).await;

    let first = timeout(WAIT, app.shutdown()).await.unwrap();
    let second = timeout(WAIT, app.shutdown()).await.unwrap();

    assert_eq!(first.len(), 3);
    assert!(second.is_empty());
}

#[rstest]
#[tokio::test]
async fn shutdown_without_launch(_broker: Arc<MemoryBroker>) {
    let app = app();
    assert!(app.shutdown().await.is_empty());
    assert!(app.signal().is_cancelled());
}

#[rstest]
#[tokio::test]
async fn launch_after_shutdown_ignored(broker: Arc<MemoryBroker>) {
    let (tx, _seen) = mpsc::unbounded_channel();
    let app = app();
    app.shutdown().await;

    app.launch(registry(&tx), Arc::clone(&broker)).await;

    assert_eq!(broker.opened("cat_created"), 0);
}

#[rstest]
#[tokio::test]
async fn repeated_launch_adds_topics(broker: Arc<MemoryBroker>) {
    let (tx, mut seen) = mpsc::unbounded_channel();
    let app = app();
    let mut extra = Registry::new();
    extra.register("cat_adopted", recorder("adopted", &tx)).unwrap();

    app.launch(registry(&tx), Arc::clone(&broker)).await;
    app.launch(extra, Arc::clone(&broker)).await;

    broker.publish("cat_adopted", "9", "{}");
    assert_eq!(next(&mut seen).await.0, "adopted");
    assert_eq!(app.shutdown().await.len(), 4);
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn grace_timeout_keeps_finished_reports(broker: Arc<MemoryBroker>) {
    let logs = Captured::default();
    let writer = logs.clone();
    let _guard = tracing::subscriber::set_default(
        fmt()
            .with_writer(move || writer.clone())
            .with_max_level(Level::WARN)
            .with_ansi(false)
            .finish(),
    );
    let (tx, mut seen) = mpsc::unbounded_channel();
    let mut registry = registry(&tx);
    let record = recorder("slow", &tx);
    registry
        .register("slow", move |msg: &Message| {
            record(msg);
            std::thread::sleep(Duration::from_secs(2));
        })
        .unwrap();
    let app = App::with_policy(Duration::from_millis(300), RestartPolicy::default());
    app.launch(registry, Arc::clone(&broker)).await;

    broker.publish("slow", "1", "{}");
    assert_eq!(next(&mut seen).await.0, "slow");

    let started = Instant::now();
    let reports = timeout(Duration::from_secs(5), app.shutdown())
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_millis(300));
    assert!(logs.text().contains("强制中止"));
    let mut finished: Vec<&str> = reports
        .iter()
        .filter(|r| r.topic != "slow")
        .inspect(|r| assert!(r.exit.is_cancelled()))
        .map(|r| r.topic.as_str())
        .collect();
    finished.sort();
    assert_eq!(finished, vec!["cat_created", "cat_deleted", "cat_updated"]);
    for topic in ["cat_created", "cat_updated", "cat_deleted"] {
        assert_eq!(broker.released(topic), 1);
    }
}

#[tokio::test]
async fn app_from_default_config() {
    let app = App::new(&ConsumerConfig::default());
    assert!(!app.signal().is_cancelled());
    assert!(app.shutdown().await.is_empty());
}

#[tokio::test]
async fn terminate_after_lifetime() {
    timeout(WAIT, terminate(Some(Duration::from_millis(20))))
        .await
        .expect("固定运行时长到期后应返回");
}
