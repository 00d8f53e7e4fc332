use std::sync::Arc;
use std::thread;

use mlog::{BufferRecord, BufferRegistry};

fn register_one(registry: &BufferRegistry, tid: u64) -> Arc<BufferRecord> {
    let record = Arc::new(BufferRecord::new(tid, 42, 1024));
    registry.register(Arc::clone(&record));
    record
}

#[test]
fn test_register_and_lookup() {
    let registry = BufferRegistry::new();
    let record = register_one(&registry, 7);

    let found = registry.lookup(7).expect("record should be registered");
    assert!(Arc::ptr_eq(&found, &record));
    assert_eq!(found.tid(), 7);
    assert_eq!(found.pid(), 42);
    assert!(registry.lookup(8).is_none());
}

#[test]
fn test_release_of_owner_reference_unregisters() {
    let registry = BufferRegistry::new();
    let record = register_one(&registry, 1);

    // A record starts with the implicit "owner alive" reference.
    registry.release(&record);
    assert!(registry.lookup(1).is_none());
    assert!(registry.is_empty());
}

#[test]
fn test_pending_task_reference_defers_teardown() {
    let registry = BufferRegistry::new();
    let record = register_one(&registry, 5);

    // A pending task takes a reference, so the owner exiting must not tear
    // the record down.
    record.acquire();
    registry.release(&record);
    assert!(registry.lookup(5).is_some(), "record still referenced by a task");

    // The writer finishing the task performs the real teardown.
    registry.release(&record);
    assert!(registry.lookup(5).is_none());
}

#[test]
fn test_ring_survives_owner_exit_until_drained() {
    let registry = BufferRegistry::new();
    let record = register_one(&registry, 9);

    record.ring().put(b"pending bytes");
    record.acquire();

    // Owner exits first; the bytes must still be readable afterwards.
    registry.release(&record);
    let mut out = [0u8; 13];
    assert_eq!(record.ring().get(&mut out), 13);
    assert_eq!(&out, b"pending bytes");
    registry.release(&record);
    assert!(registry.is_empty());
}

#[test]
fn test_racing_releases_unregister_exactly_once() {
    // The owning thread's exit hook and the writer race to decrement; the
    // registry must end empty without panicking, for every interleaving.
    for round in 0..200 {
        let registry = Arc::new(BufferRegistry::new());
        let record = register_one(&registry, round);
        record.acquire();

        let writer = {
            let registry = Arc::clone(&registry);
            let record = Arc::clone(&record);
            thread::spawn(move || registry.release(&record))
        };
        registry.release(&record);
        writer.join().unwrap();

        assert!(registry.is_empty(), "round {}: record not torn down", round);
    }
}

#[test]
fn test_many_records_cleaned_up_independently() {
    let registry = BufferRegistry::new();
    let records: Vec<_> = (0..32).map(|tid| register_one(&registry, tid)).collect();
    assert_eq!(registry.len(), 32);

    for record in &records {
        registry.release(record);
    }
    assert!(registry.is_empty());
}
