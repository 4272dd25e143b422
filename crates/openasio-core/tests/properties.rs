//! Property-based tests for openasio-core.
//!
//! Covers layout round trips, integer conversion bounds, configuration
//! acceptance against capability masks, and the lifecycle table.

use openasio_core::{
    BufferAdapter, BufferLayout, Capabilities, Error, Operation, Sample, SampleBuffer,
    SampleFormat, SessionState, StreamConfig, deinterleave, ensure_allowed, interleave,
};
use proptest::prelude::*;

fn any_format() -> impl Strategy<Value = SampleFormat> {
    prop::sample::select(SampleFormat::ALL.to_vec())
}

fn any_layout() -> impl Strategy<Value = BufferLayout> {
    prop::sample::select(BufferLayout::ALL.to_vec())
}

fn any_state() -> impl Strategy<Value = SessionState> {
    prop::sample::select(SessionState::ALL.to_vec())
}

fn any_op() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Non-interleaved → interleaved → non-interleaved reproduces f32 bit patterns.
    #[test]
    fn planar_roundtrip_f32_bit_exact(
        channels in 1usize..8,
        frames in 1usize..64,
        seed in prop::collection::vec(any::<f32>(), 512),
    ) {
        let planar: Vec<f32> = seed.iter().cycle().take(channels * frames).copied().collect();
        let mut inter = vec![0.0f32; planar.len()];
        let mut back = vec![0.0f32; planar.len()];
        interleave(&planar, &mut inter, channels);
        deinterleave(&inter, &mut back, channels);
        for (a, b) in planar.iter().zip(&back) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    /// Same round trip for 16-bit integers.
    #[test]
    fn planar_roundtrip_i16_exact(
        channels in 1usize..8,
        frames in 1usize..64,
        seed in prop::collection::vec(any::<i16>(), 512),
    ) {
        let planar: Vec<i16> = seed.iter().cycle().take(channels * frames).copied().collect();
        let mut inter = vec![0i16; planar.len()];
        let mut back = vec![0i16; planar.len()];
        interleave(&planar, &mut inter, channels);
        deinterleave(&inter, &mut back, channels);
        prop_assert_eq!(planar, back);
    }

    /// Any i16 survives i16 → f32 → i16.
    #[test]
    fn i16_float_roundtrip(v in any::<i16>()) {
        prop_assert_eq!(i16::from_f32(v.to_f32()), v);
    }

    /// Any u16 survives u16 → f32 → u16.
    #[test]
    fn u16_float_roundtrip(v in any::<u16>()) {
        prop_assert_eq!(u16::from_f32(v.to_f32()), v);
    }

    /// Converted floats stay within [-1, 1] and outside values clamp.
    #[test]
    fn integer_conversion_clamps(x in -4.0f32..4.0f32) {
        let i = i16::from_f32(x);
        if x >= 1.0 { prop_assert_eq!(i, i16::MAX); }
        if x <= -1.0 { prop_assert_eq!(i, i16::MIN); }
        let back = i.to_f32();
        prop_assert!((-1.0..=1.0).contains(&back));
    }

    /// Host → device → host through the adapter is exact for every format and layout.
    #[test]
    fn adapter_roundtrip(
        channels in 1usize..6,
        frames in 1usize..48,
        format in any_format(),
        layout in any_layout(),
        seed in prop::collection::vec(-1.0f32..=1.0f32, 256),
    ) {
        let adapter = BufferAdapter::new(channels, frames, format, layout);
        let mut host = adapter.allocate_host_buffer();
        {
            let mut view = host.as_samples_mut();
            for i in 0..adapter.len() {
                view.set_f32(i, seed[i % seed.len()]);
            }
        }
        let mut device = adapter.allocate_device_buffer();
        adapter.host_to_device(host.as_samples(), &mut device);
        let mut back = SampleBuffer::silent(format, adapter.len());
        adapter.device_to_host(&device, back.as_samples_mut());
        prop_assert_eq!(host, back);
    }

    /// A config is accepted by a mask iff every direction it uses is advertised.
    #[test]
    fn capability_acceptance(
        in_channels in 0u16..4,
        out_channels in 0u16..4,
        bits in 0u32..32,
    ) {
        let caps = Capabilities::from_bits_truncate(bits);
        let cfg = StreamConfig::default().with_channels(in_channels, out_channels);
        let needs_in = in_channels > 0;
        let needs_out = out_channels > 0;
        let expected = (!needs_in || caps.supports_input())
            && (!needs_out || caps.supports_output())
            && (!(needs_in && needs_out) || caps.supports_full_duplex());
        let result = cfg.check_capabilities(caps);
        prop_assert_eq!(result.is_ok(), expected);
        if let Err(e) = result {
            prop_assert!(matches!(e, Error::Unsupported(_)));
        }
    }

    /// Rejections from the lifecycle table are always State errors naming the call.
    #[test]
    fn lifecycle_rejections_are_state_errors(op in any_op(), state in any_state()) {
        match ensure_allowed(op, state) {
            Ok(()) => prop_assert!(op.is_allowed_in(state)),
            Err(Error::State { op: o, state: s }) => {
                prop_assert_eq!(o, op);
                prop_assert_eq!(s, state);
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }
}
