//! Render-Target Pool Tests
//!
//! Tests for:
//! - Exact resolution reporting across request sizes
//! - The documented precision/filter fallback table
//! - Mip-chain sizing for mipmapped targets

use lustre::renderer::context::DeviceCaps;
use lustre::renderer::target::{
    TargetConfig, TargetFilter, TargetPrecision, TargetSpec, full_mip_count,
};

const NO_HALF_FLOAT: DeviceCaps = DeviceCaps {
    half_float_renderable: false,
    half_float_filterable: false,
};

const UNFILTERABLE_HALF_FLOAT: DeviceCaps = DeviceCaps {
    half_float_renderable: true,
    half_float_filterable: false,
};

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn resolved_spec_reports_the_requested_resolution_exactly() {
    for (width, height) in [(1, 1), (360, 640), (1024, 1024), (1920, 1080), (333, 777)] {
        for config in [TargetConfig::SHADOW, TargetConfig::TRANSMISSION, TargetConfig::SCENE] {
            let spec = TargetSpec::resolve(width, height, config, DeviceCaps::full());
            assert_eq!((spec.width, spec.height), (width, height));

            // Capability fallbacks never touch resolution either.
            let fallback = TargetSpec::resolve(width, height, config, NO_HALF_FLOAT);
            assert_eq!((fallback.width, fallback.height), (width, height));
        }
    }
}

// ============================================================================
// Fallback table
// ============================================================================

#[test]
fn half_float_request_on_byte_only_device_degrades_to_byte() {
    let spec = TargetSpec::resolve(1024, 1024, TargetConfig::TRANSMISSION, NO_HALF_FLOAT);
    assert_eq!(spec.format, wgpu::TextureFormat::Rgba8Unorm);
    assert_eq!(spec.filter, TargetFilter::Linear, "byte formats always filter");
}

#[test]
fn unfilterable_half_float_keeps_format_but_drops_to_nearest() {
    let spec = TargetSpec::resolve(512, 512, TargetConfig::TRANSMISSION, UNFILTERABLE_HALF_FLOAT);
    assert_eq!(spec.format, wgpu::TextureFormat::Rgba16Float);
    assert_eq!(spec.filter, TargetFilter::Nearest);
}

#[test]
fn byte_requests_are_never_substituted() {
    for caps in [DeviceCaps::full(), NO_HALF_FLOAT, UNFILTERABLE_HALF_FLOAT] {
        let spec = TargetSpec::resolve(1024, 1024, TargetConfig::SHADOW, caps);
        assert_eq!(spec.format, wgpu::TextureFormat::Rgba8Unorm);
        assert_eq!(spec.filter, TargetFilter::Nearest);
    }
}

#[test]
fn full_caps_honor_the_request_verbatim() {
    let spec = TargetSpec::resolve(1024, 1024, TargetConfig::TRANSMISSION, DeviceCaps::full());
    assert_eq!(spec.format, wgpu::TextureFormat::Rgba16Float);
    assert_eq!(spec.filter, TargetFilter::Linear);
}

// ============================================================================
// Mip chains
// ============================================================================

#[test]
fn transmission_target_gets_a_full_mip_chain() {
    let spec = TargetSpec::resolve(1024, 1024, TargetConfig::TRANSMISSION, DeviceCaps::full());
    assert_eq!(spec.mip_level_count, 11);

    let flat = TargetSpec::resolve(1024, 1024, TargetConfig::SHADOW, DeviceCaps::full());
    assert_eq!(flat.mip_level_count, 1);
}

#[test]
fn mip_count_is_anchored_on_the_larger_dimension() {
    assert_eq!(full_mip_count(1, 1), 1);
    assert_eq!(full_mip_count(2, 1), 2);
    assert_eq!(full_mip_count(1024, 4), 11);
    assert_eq!(full_mip_count(4, 1024), 11);
}

#[test]
fn custom_config_combinations_resolve_consistently() {
    let config = TargetConfig {
        filter: TargetFilter::Nearest,
        precision: TargetPrecision::HalfFloat,
        mipmapped: false,
    };
    // Nearest never depends on filterability.
    let spec = TargetSpec::resolve(256, 256, config, UNFILTERABLE_HALF_FLOAT);
    assert_eq!(spec.format, wgpu::TextureFormat::Rgba16Float);
    assert_eq!(spec.filter, TargetFilter::Nearest);
}
