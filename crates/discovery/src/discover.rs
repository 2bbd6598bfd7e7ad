//! One discovery run: probe, collect, query, aggregate.

use std::collections::HashSet;
use std::sync::Arc;

use rigprobe_miner_api::DeviceQuery;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::DiscoveryError;
use crate::aggregate::aggregate;
use crate::broadcast::Broadcaster;
use crate::config::DiscoveryConfig;
use crate::listener::Listener;
use crate::pool::WorkerPool;
use crate::types::{DiscoveryReport, EndpointCandidate};

/// Buffered candidates between the listener and the pool.
const CANDIDATE_QUEUE: usize = 64;

/// Runs discovery and returns the devices of every endpoint that answered.
///
/// Endpoints are queried as soon as they are announced, overlapping with
/// the rest of the listen window. Only setup failures are returned as
/// errors; an empty network yields an empty report.
pub async fn discover(
    config: &DiscoveryConfig,
    query: Arc<dyn DeviceQuery>,
) -> Result<DiscoveryReport, DiscoveryError> {
    config.validate()?;

    let (ready_tx, ready_rx) = oneshot::channel();
    let broadcaster = Broadcaster::new(config);
    debug!(probe_target = %broadcaster.target(), family = %config.family, "starting discovery");
    let probe = tokio::spawn(broadcaster.run(ready_rx));

    // Dropping ready_tx on failure lets the broadcaster finish without sending.
    let listener = Listener::bind(config).await?;
    let report_port = listener
        .local_addr()
        .map_err(|source| DiscoveryError::Bind {
            addr: config.listen_socket_addr(),
            source,
        })?
        .port();
    let _ = ready_tx.send(report_port);

    let (tx, mut rx) = mpsc::channel(CANDIDATE_QUEUE);
    let listen = tokio::spawn(listener.run(tx));

    let family = config.family;
    let mut pool = WorkerPool::new(config.concurrency, move |endpoint: EndpointCandidate| {
        let query = Arc::clone(&query);
        async move { query.devices(endpoint.family(family), endpoint.port).await }
    });

    let mut admitted = HashSet::new();
    while let Some(endpoint) = rx.recv().await {
        if !admitted.insert(endpoint.port) {
            debug!(port = endpoint.port, tag = %endpoint.tag, "duplicate announcement ignored");
            continue;
        }
        pool.submit(endpoint);
    }

    let stats = listen
        .await
        .map_err(|e| DiscoveryError::Task(format!("listener: {e}")))?;

    match probe.await {
        Ok(Ok(0)) => warn!("no probe datagrams were sent"),
        Ok(Ok(sent)) => debug!(sent, "probe complete"),
        Ok(Err(e)) => return Err(e),
        Err(e) => return Err(DiscoveryError::Task(format!("broadcaster: {e}"))),
    }

    let outcomes = pool.drain().await;
    let report = aggregate(family, outcomes);

    info!(
        replies = stats.received,
        endpoints = report.summary.attempted,
        succeeded = report.summary.succeeded,
        failed = report.summary.failed,
        devices = report.data.len(),
        "discovery finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourcePolicy;
    use rigprobe_miner_api::{Device, QueryError, QueryFuture};
    use rigprobe_protocol::{Family, ProbeMessage};
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::net::UdpSocket;

    /// Answers port 4028 with two devices; every other port times out.
    #[derive(Default)]
    struct FakeDaemons {
        calls: Mutex<Vec<(Family, u16)>>,
    }

    impl DeviceQuery for FakeDaemons {
        fn devices(&self, family: Family, port: u16) -> QueryFuture<'_> {
            self.calls.lock().unwrap().push((family, port));
            Box::pin(async move {
                match port {
                    4028 => Ok(vec![
                        Device { id: 0, name: "BTM".into(), ..Default::default() },
                        Device { id: 1, name: "BTM".into(), ..Default::default() },
                    ]),
                    _ => {
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Err(QueryError::Timeout { addr: format!("127.0.0.1:{port}") })
                    }
                }
            })
        }
    }

    fn test_config(probe_target: SocketAddr, window: Duration) -> DiscoveryConfig {
        let mut config = DiscoveryConfig::for_family(Family::Cgminer);
        config.multicast_group = probe_target.ip();
        config.probe_port = probe_target.port();
        config.listen_addr = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.report_port = 0;
        config.window = window;
        config.source_policy = SourcePolicy::Any;
        config
    }

    /// Stands in for the multicast group: records probes and answers the
    /// first one with `replies`.
    fn responder(
        socket: UdpSocket,
        replies: Vec<&'static str>,
    ) -> tokio::task::JoinHandle<Vec<String>> {
        tokio::spawn(async move {
            let mut probes = Vec::new();
            let mut buf = [0u8; 512];
            while let Ok(Ok((n, _))) =
                tokio::time::timeout(Duration::from_millis(500), socket.recv_from(&mut buf)).await
            {
                let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                if probes.is_empty() {
                    let probe = ProbeMessage::parse(&text).unwrap();
                    let report: SocketAddr = (Ipv4Addr::LOCALHOST, probe.port).into();
                    for reply in &replies {
                        socket.send_to(reply.as_bytes(), report).await.unwrap();
                    }
                }
                probes.push(text);
            }
            probes
        })
    }

    #[tokio::test]
    async fn discovers_and_aggregates() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = test_config(socket.local_addr().unwrap(), Duration::from_millis(800));
        let daemon = responder(socket, vec!["cgminer-FTW-4028", "sgminer-FTW-4029", "garbage"]);

        let fake = Arc::new(FakeDaemons::default());
        let report = discover(&config, fake.clone()).await.unwrap();

        assert_eq!(report.summary.attempted, 2);
        assert_eq!(report.summary.succeeded, 1);
        assert_eq!(report.summary.failed, 1);

        let items = report.data.items();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.get("PORT") == Some("4028")));
        assert_eq!(items[0].get("DEVID"), Some("0"));
        assert_eq!(items[1].get("DEVID"), Some("1"));
        assert_eq!(items[0].get("NAME"), Some("BTM"));

        let probes = daemon.await.unwrap();
        assert!(probes.iter().any(|p| p.starts_with("cgminer-FTW-")));
        assert!(probes.iter().any(|p| p.starts_with("sgminer-FTW-")));

        let mut calls = fake.calls.lock().unwrap().clone();
        calls.sort_by_key(|c| c.1);
        assert_eq!(calls, [(Family::Cgminer, 4028), (Family::Cgminer, 4029)]);
    }

    #[tokio::test]
    async fn duplicate_announcements_query_once() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = test_config(socket.local_addr().unwrap(), Duration::from_millis(500));
        let _daemon = responder(
            socket,
            vec!["cgminer-FTW-4028", "cgminer-FTW-4028", "cgm-FTW-4028-rig"],
        );

        let fake = Arc::new(FakeDaemons::default());
        let report = discover(&config, fake.clone()).await.unwrap();

        assert_eq!(fake.calls.lock().unwrap().len(), 1);
        assert_eq!(report.summary.attempted, 1);
        assert_eq!(report.data.len(), 2);
    }

    #[tokio::test]
    async fn silent_network_yields_empty_report() {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let config = test_config(socket.local_addr().unwrap(), Duration::from_millis(200));

        let report = discover(&config, Arc::new(FakeDaemons::default()))
            .await
            .unwrap();
        assert!(report.data.is_empty());
        assert_eq!(report.summary.attempted, 0);
        assert_eq!(report.data.to_json().unwrap(), r#"{"data":[]}"#);
    }

    #[tokio::test]
    async fn occupied_report_port_fails() {
        let taken = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let mut config = test_config("127.0.0.1:9".parse().unwrap(), Duration::from_millis(200));
        config.report_port = taken.local_addr().unwrap().port();

        let err = discover(&config, Arc::new(FakeDaemons::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Bind { .. }));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected() {
        let mut config = DiscoveryConfig::default();
        config.concurrency = 0;
        let err = discover(&config, Arc::new(FakeDaemons::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Config(_)));
    }
}
