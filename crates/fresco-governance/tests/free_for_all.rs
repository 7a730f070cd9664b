//! End-to-end free-for-all governance over in-memory ledgers.

use fresco_governance::{find_canvas, publish_canvas, ModelRegistry};
use fresco_ledger::{Identity, Ledger, MemoryHub, MemoryLedger};
use fresco_records::{canvas_stream, vote_stream, Canvas, Colour, Location, Mode, Period};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};

const DIFFICULTY: u32 = 8;
const RED: Colour = Colour::opaque(255, 0, 0);
const BLUE: Colour = Colour::opaque(0, 0, 255);
const GREEN: Colour = Colour::opaque(0, 255, 0);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[tokio::test(flavor = "multi_thread")]
async fn a_community_paints_and_the_plurality_wins() {
    init_tracing();
    let ledger = Arc::new(MemoryLedger::new("node"));
    let identity = Arc::new(Identity::generate("alice"));
    let registry = ModelRegistry::new(
        Arc::clone(&ledger) as Arc<dyn Ledger>,
        Arc::clone(&identity),
        DIFFICULTY,
    );

    let period = Period(2026);
    let canvas = Canvas::new("mural", 16, 16, 1, Mode::FreeForAll);
    let id = publish_canvas(&*ledger, &identity, period, &canvas, DIFFICULTY).unwrap();
    let found = find_canvas(&*ledger, period, &id).unwrap().expect("canvas published");

    let (tx, mut updates) = mpsc::unbounded_channel();
    let model = registry
        .open(id, found, Some(Arc::new(move || {
            let _ = tx.send(());
        })))
        .unwrap();

    // Wait out the initial synchronization so the next refresh is ours.
    timeout(Duration::from_secs(1), updates.recv())
        .await
        .expect("initial synchronization never completed");

    let contested = Location::cell(3, 4, 0);
    let quiet = Location::cell(5, 5, 0);
    for colour in [RED, BLUE, RED, BLUE, RED] {
        model.write(&contested, &colour).unwrap();
    }
    model.write(&quiet, &GREEN).unwrap();
    model.refresh().await;

    // The background task mines the writes, the head change triggers a
    // refresh, and resolution converges; wait on observer updates.
    timeout(Duration::from_secs(5), async {
        loop {
            if model.resolve(&contested).await == Some(RED)
                && model.resolve(&quiet).await == Some(GREEN)
            {
                break;
            }
            updates.recv().await.expect("observer channel closed");
        }
    })
    .await
    .expect("resolution never converged");

    // An untouched cell has no winner.
    assert_eq!(model.resolve(&Location::cell(0, 0, 0)).await, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn two_peers_converge_through_a_hub() {
    init_tracing();
    let hub = Arc::new(MemoryHub::new());
    let ledger_a = Arc::new(
        MemoryLedger::new("peer-a")
            .with_hub(Arc::clone(&hub))
            .with_min_difficulty(DIFFICULTY),
    );
    let ledger_b = Arc::new(
        MemoryLedger::new("peer-b")
            .with_hub(Arc::clone(&hub))
            .with_min_difficulty(DIFFICULTY),
    );
    let alice = Arc::new(Identity::generate("alice"));
    let bob = Arc::new(Identity::generate("bob"));

    // Alice publishes this period's canvas and shares the stream.
    let period = Period(2026);
    let canvas = Canvas::new("mural", 16, 16, 1, Mode::FreeForAll);
    let id = publish_canvas(&*ledger_a, &alice, period, &canvas, DIFFICULTY).unwrap();
    ledger_a.push(&canvas_stream(period)).unwrap();

    // Bob pulls the canvas stream and discovers the canvas by id.
    assert!(ledger_b.pull(&canvas_stream(period)).unwrap());
    let found = find_canvas(&*ledger_b, period, &id).unwrap().expect("canvas replicated");

    let registry_a = ModelRegistry::new(
        Arc::clone(&ledger_a) as Arc<dyn Ledger>,
        Arc::clone(&alice),
        DIFFICULTY,
    );
    let registry_b = ModelRegistry::new(
        Arc::clone(&ledger_b) as Arc<dyn Ledger>,
        Arc::clone(&bob),
        DIFFICULTY,
    );
    let model_a = registry_a.open(id.clone(), canvas, None).unwrap();
    let model_b = registry_b.open(id.clone(), found, None).unwrap();

    // Alice paints; her refresh cycles mine and push until the hub has it.
    let cell = Location::cell(7, 7, 0);
    model_a.write(&cell, &RED).unwrap();
    timeout(Duration::from_secs(5), async {
        loop {
            model_a.refresh().await;
            if hub.chain_length(&vote_stream(&id)) > 0 {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("alice's vote never reached the hub");

    // Bob's refresh cycles pull until the vote is visible.
    timeout(Duration::from_secs(5), async {
        loop {
            model_b.refresh().await;
            if model_b.resolve(&cell).await == Some(RED) {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("peers never converged");
}
