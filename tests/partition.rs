mod common;

use common::pool;
use proxy_traffic::scheduler::schedule;
use proxy_traffic::ProxyDescriptor;

#[test]
fn three_proxies_two_workers_gives_three_single_shards() {
    let proxies = pool(3);
    let (shards, actual) = schedule(&proxies, 2);

    let layout: Vec<Vec<ProxyDescriptor>> = shards.into_iter().map(|s| s.proxies).collect();
    assert_eq!(
        layout,
        vec![
            vec![proxies[0].clone()],
            vec![proxies[1].clone()],
            vec![proxies[2].clone()],
        ]
    );
    assert_eq!(actual, 2);
}

#[test]
fn concatenation_reproduces_the_pool() {
    for len in 1..=40 {
        let proxies = pool(len);
        for requested in 1..=12 {
            let (shards, actual) = schedule(&proxies, requested);

            let joined: Vec<ProxyDescriptor> = shards.iter().flat_map(|s| s.proxies.clone()).collect();
            assert_eq!(joined, proxies, "len={} workers={}", len, requested);
            assert_eq!(actual, requested.min(shards.len()), "len={} workers={}", len, requested);
            assert!(actual >= 1);
        }
    }
}

#[test]
fn only_the_last_shard_differs_in_size() {
    for len in 1..=40 {
        let proxies = pool(len);
        for requested in 1..=12 {
            let (shards, _) = schedule(&proxies, requested);
            let chunk = (len / requested).max(1);

            let (last, rest) = shards.split_last().expect("at least one shard");
            assert!(rest.iter().all(|s| s.proxies.len() == chunk));
            assert!(!last.proxies.is_empty());
            assert_eq!(shards.len(), len.div_ceil(chunk));
        }
    }
}

#[test]
fn no_shard_is_empty_and_ids_are_sequential() {
    let (shards, _) = schedule(&pool(17), 4);
    for (idx, shard) in shards.iter().enumerate() {
        assert_eq!(shard.id, idx);
        assert!(!shard.proxies.is_empty());
    }
}
