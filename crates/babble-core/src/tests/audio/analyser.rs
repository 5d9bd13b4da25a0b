use crate::{
    AnalysisNode, Analyser, CoreError, RecorderConfig, TIME_DOMAIN_MIDPOINT,
    tests::support::tone,
};

fn config(fft_size: usize) -> RecorderConfig {
    RecorderConfig {
        fft_size,
        ..RecorderConfig::default()
    }
}

/// WHAT: A fresh analyser reads as silence
/// WHY: Sampling before the first callback must return baseline values
#[test]
#[allow(clippy::unwrap_used)]
fn given_no_input_when_reading_then_midpoint_and_zero_bins() {
    // Given: An analyser nobody has written to
    let (mut analyser, _input) = Analyser::new(&config(2048)).unwrap();
    let mut time = vec![0u8; 2048];
    let mut freq = vec![7u8; 2048];

    // When: Reading both buffers
    analyser.byte_time_domain_data(&mut time).unwrap();
    analyser.byte_frequency_data(&mut freq).unwrap();

    // Then: Time bytes at midpoint, bins zero, tail untouched
    assert!(time.iter().all(|&b| b == TIME_DOMAIN_MIDPOINT));
    assert!(freq[..1024].iter().all(|&b| b == 0));
    assert!(freq[1024..].iter().all(|&b| b == 7));
}

/// WHAT: A sine tone produces energy around its bin
/// WHY: The frequency signal must react to real input
#[test]
#[allow(clippy::unwrap_used)]
fn given_tone_when_reading_frequency_then_peak_near_expected_bin() {
    // Given: A 1 kHz tone at 8 kHz sample rate, 2048-point window
    let (mut analyser, input) = Analyser::new(&config(2048)).unwrap();
    input.push(&tone(1000.0, 0.5, 4096));
    let mut freq = vec![0u8; 1024];

    // When: Reading the spectrum
    analyser.byte_frequency_data(&mut freq).unwrap();

    // Then: Loudest bin is 1000 / 8000 * 2048 = 256 (within leakage)
    let (peak, _) = freq
        .iter()
        .enumerate()
        .max_by_key(|(_, b)| **b)
        .unwrap();
    assert!((250..=262).contains(&peak), "peak at bin {}", peak);
    assert!(freq[peak] > 0);
}

/// WHAT: Full-scale samples clamp to the byte range
/// WHY: +1.0 would map to 256 without clamping
#[test]
#[allow(clippy::unwrap_used)]
fn given_full_scale_samples_when_reading_time_domain_then_clamped() {
    // Given: Window filled with +1.0 then -1.0 halves
    let (analyser, input) = Analyser::new(&config(32)).unwrap();
    let mut samples = vec![1.0f32; 16];
    samples.extend(std::iter::repeat_n(-1.0f32, 16));
    input.push(&samples);
    let mut time = vec![0u8; 32];

    // When: Reading
    analyser.byte_time_domain_data(&mut time).unwrap();

    // Then: 255 for the positive half, 0 for the negative half
    assert!(time[..16].iter().all(|&b| b == 255));
    assert!(time[16..].iter().all(|&b| b == 0));
}

/// WHAT: Window sizes that are not powers of two are rejected
/// WHY: The FFT node only accepts power-of-two windows in range
#[test]
fn given_bad_fft_size_when_creating_then_invalid_config() {
    // Given/When: Non power of two, too small, too large
    let results = [1000usize, 16, 65_536].map(|n| Analyser::new(&config(n)).is_err());

    // Then: All rejected with InvalidConfig
    assert_eq!(results, [true, true, true]);
    assert!(matches!(
        Analyser::new(&config(1000)),
        Err(CoreError::InvalidConfig { .. })
    ));
}

/// WHAT: Decibel bounds that are not finite or not ordered are rejected
/// WHY: A NaN range would turn every frequency byte into zero
#[test]
fn given_bad_decibel_range_when_creating_then_invalid_config() {
    // Given: NaN, infinite and inverted bounds
    let ranges = [
        (f32::NAN, -30.0),
        (-100.0, f32::NAN),
        (f32::NEG_INFINITY, -30.0),
        (-30.0, -100.0),
    ];

    // When: Creating an analyser and validating a recorder config for each
    for (min_decibels, max_decibels) in ranges {
        let config = RecorderConfig {
            min_decibels,
            max_decibels,
            ..RecorderConfig::default()
        };

        // Then: Both paths refuse the range
        assert!(matches!(
            Analyser::new(&config),
            Err(CoreError::InvalidConfig { .. })
        ));
        assert!(matches!(
            config.validate(),
            Err(CoreError::InvalidConfig { .. })
        ));
    }
}

/// WHAT: Reads after detach fail and writes are dropped
/// WHY: A disposed session must never be read silently
#[test]
#[allow(clippy::unwrap_used)]
fn given_detached_analyser_when_reading_then_stale_handle() {
    // Given: An analyser that saw 64 samples and was detached
    let (mut analyser, input) = Analyser::new(&config(32)).unwrap();
    input.push(&[0.1; 64]);
    analyser.detach();

    // When: Pushing more and reading
    input.push(&[0.1; 64]);
    let time = analyser.byte_time_domain_data(&mut [0u8; 32]);
    let freq = analyser.byte_frequency_data(&mut [0u8; 32]);

    // Then: Both reads fail, the late push was ignored
    assert!(matches!(time, Err(CoreError::StaleHandle { .. })));
    assert!(matches!(freq, Err(CoreError::StaleHandle { .. })));
    assert_eq!(analyser.samples_seen(), 64);
}
