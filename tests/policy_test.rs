use img_cache_engine::policy::strategy::DiskCacheStrategy;
use img_cache_engine::policy::types::{CacheDecision, DataSource, EncodeStrategy};

const POLICY: DiskCacheStrategy = DiskCacheStrategy::TransportBacked;

#[test]
fn test_raw_data_never_cached() {
    for source in DataSource::ALL {
        assert!(!POLICY.should_cache_raw_data(source), "source={:?}", source);
    }
}

#[test]
fn test_untransformed_encodings_never_cached() {
    for source in DataSource::ALL {
        for alternate in [false, true] {
            for encode in [EncodeStrategy::Source, EncodeStrategy::None] {
                assert!(
                    !POLICY.should_cache_transformed_resource(alternate, source, encode),
                    "source={:?} alternate={} encode={:?}",
                    source,
                    alternate,
                    encode
                );
            }
        }
    }
}

#[test]
fn test_transformed_cached_only_for_fresh_fetches() {
    for alternate in [false, true] {
        for source in DataSource::ALL {
            let expected = matches!(source, DataSource::Local | DataSource::Remote);
            assert_eq!(
                POLICY.should_cache_transformed_resource(
                    alternate,
                    source,
                    EncodeStrategy::Transformed
                ),
                expected,
                "source={:?} alternate={}",
                source,
                alternate
            );
        }
    }
}

#[test]
fn test_decode_preferences() {
    assert!(POLICY.should_decode_cached_transformed_resource());
    assert!(!POLICY.should_decode_cached_raw_data());
}

#[test]
fn test_cache_hits_are_never_rewritten() {
    for source in [
        DataSource::DataDiskCache,
        DataSource::ResourceDiskCache,
        DataSource::MemoryCache,
    ] {
        for encode in EncodeStrategy::ALL {
            assert_eq!(
                POLICY.decide(true, source, encode),
                CacheDecision::default(),
                "source={:?} encode={:?}",
                source,
                encode
            );
        }
    }
}

#[test]
fn test_remote_transformed_decision() {
    let decision = POLICY.decide(false, DataSource::Remote, EncodeStrategy::Transformed);
    assert_eq!(
        decision,
        CacheDecision {
            cache_raw_data: false,
            cache_transformed_resource: true,
        }
    );
}

#[test]
fn test_alternate_key_differs_from_automatic() {
    // Automatic re-caches transformed alternate-key data-cache hits; the
    // transport-backed strategy does not.
    let t = EncodeStrategy::Transformed;
    assert!(DiskCacheStrategy::Automatic.should_cache_transformed_resource(
        true,
        DataSource::DataDiskCache,
        t
    ));
    assert!(!POLICY.should_cache_transformed_resource(true, DataSource::DataDiskCache, t));
}

#[test]
fn test_resource_strategy() {
    let resource = DiskCacheStrategy::Resource;
    for source in DataSource::ALL {
        assert!(!resource.should_cache_raw_data(source));
    }
    assert!(resource.should_cache_transformed_resource(
        false,
        DataSource::DataDiskCache,
        EncodeStrategy::Source
    ));
    assert!(!resource.should_cache_transformed_resource(
        false,
        DataSource::ResourceDiskCache,
        EncodeStrategy::Transformed
    ));
    assert!(resource.should_decode_cached_transformed_resource());
    assert!(!resource.should_decode_cached_raw_data());
}
