use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How often the snapshot cache re-captures the rig.
pub const CACHE_POLL_PERIOD: Duration = Duration::from_secs(2);
/// How often the latest snapshot is appended to the history store.
pub const DB_POLL_PERIOD: Duration = Duration::from_secs(60);

/// Spawns one cadence lane: fire `tick` immediately, then re-arm `period`
/// after each firing completes. The shutdown signal cancels future firings;
/// a tick already in flight always runs to completion, since it may have
/// hardware or storage side effects that should not be left half-applied.
pub fn spawn_lane<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        log::debug!("{name} lane started, period {period:?}");
        loop {
            tick().await;

            tokio::select! {
                _ = shutdown.changed() => {
                    log::info!("{name} lane cancelled");
                    break;
                }
                _ = tokio::time::sleep(period) => {}
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counting_tick(count: &Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<()> + Send + use<> {
        let count = Arc::clone(count);
        move || {
            count.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn lanes_fire_immediately_and_on_independent_cadences() {
        let (tx, rx) = watch::channel(false);
        let fast_count = Arc::new(AtomicUsize::new(0));
        let slow_count = Arc::new(AtomicUsize::new(0));

        let fast = spawn_lane(
            "fast",
            Duration::from_secs(2),
            rx.clone(),
            counting_tick(&fast_count),
        );
        let slow = spawn_lane(
            "slow",
            Duration::from_secs(60),
            rx.clone(),
            counting_tick(&slow_count),
        );

        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(fast_count.load(Ordering::SeqCst), 1);
        assert_eq!(slow_count.load(Ordering::SeqCst), 1);

        for _ in 0..61 {
            tokio::time::advance(Duration::from_secs(1)).await;
        }

        assert!(fast_count.load(Ordering::SeqCst) >= 30);
        assert!(slow_count.load(Ordering::SeqCst) >= 2);

        tx.send(true).unwrap();
        fast.await.unwrap();
        slow.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_lane_schedules_no_further_firings() {
        let (tx, rx) = watch::channel(false);
        let count = Arc::new(AtomicUsize::new(0));
        let lane = spawn_lane("lane", Duration::from_secs(5), rx, counting_tick(&count));

        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        tx.send(true).unwrap();
        lane.await.unwrap();

        tokio::time::advance(Duration::from_secs(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_tick_completes_across_shutdown() {
        let (tx, rx) = watch::channel(false);
        let completed = Arc::new(AtomicUsize::new(0));
        let lane = {
            let completed = Arc::clone(&completed);
            spawn_lane("lane", Duration::from_secs(5), rx, move || {
                let completed = Arc::clone(&completed);
                async move {
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    completed.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        // The first tick is still sleeping when shutdown lands.
        assert_eq!(completed.load(Ordering::SeqCst), 0);
        tx.send(true).unwrap();

        lane.await.unwrap();
        assert_eq!(completed.load(Ordering::SeqCst), 1);
    }
}
