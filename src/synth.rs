//! 合成ユーザーの行動特徴とラベルの生成。
//! グラフ次数を潜在シグナルとしてラベルと相関させる。

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::Serialize;

/// Degree at or below which a user is labeled fake.
pub const FAKE_DEGREE_THRESHOLD: usize = 5;

const SYNTH_SEED: u64 = 42;

/// Behavioral record for one synthetic user. Serialized verbatim into the
/// `synthetic_data` field of the response.
#[derive(Debug, Clone, Serialize)]
pub struct BehavioralProfile {
    pub number_of_posts: u32,
    pub number_of_requests: u32,
    pub account_age_days: u32,
    pub number_of_followers: u32,
    pub label: u8,
}

/// Generates one behavioral profile per user from the graph degrees.
///
/// The label is a deterministic function of the degree (fake when degree
/// is at most [`FAKE_DEGREE_THRESHOLD`]); posts and requests are drawn
/// from label-conditioned ranges so the correlation is learnable but
/// noisy. Account age is uniform noise, uncorrelated with the label.
/// The RNG is seeded, so profiles are reproducible given the same degrees.
#[must_use]
pub fn generate_profiles(degrees: &[usize], degree_threshold: usize) -> Vec<BehavioralProfile> {
    let mut rng = StdRng::seed_from_u64(SYNTH_SEED);

    degrees
        .iter()
        .map(|&degree| {
            let account_age_days = rng.gen_range(30..365);
            let fake = degree <= degree_threshold;

            let (base_posts, requests) = if fake {
                (rng.gen_range(50..200), rng.gen_range(0..10))
            } else {
                (rng.gen_range(50..500), rng.gen_range(10..100))
            };
            let bonus = if fake {
                rng.gen_range(100..300)
            } else {
                rng.gen_range(50..150)
            };

            BehavioralProfile {
                number_of_posts: base_posts + bonus,
                number_of_requests: requests,
                account_age_days,
                number_of_followers: degree as u32,
                label: u8::from(fake),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_degrees() -> Vec<usize> {
        (0..50).map(|i| i % 14).collect()
    }

    #[test]
    fn label_policy_follows_degree_threshold() {
        let degrees = sample_degrees();
        let profiles = generate_profiles(&degrees, FAKE_DEGREE_THRESHOLD);
        assert_eq!(profiles.len(), degrees.len());
        for (profile, &degree) in profiles.iter().zip(&degrees) {
            let expected = u8::from(degree <= FAKE_DEGREE_THRESHOLD);
            assert_eq!(profile.label, expected, "degree {degree}");
            assert_eq!(profile.number_of_followers as usize, degree);
        }
    }

    #[test]
    fn request_ranges_are_disjoint_by_label() {
        let profiles = generate_profiles(&sample_degrees(), FAKE_DEGREE_THRESHOLD);
        for profile in &profiles {
            if profile.label == 1 {
                assert!(profile.number_of_requests < 10);
            } else {
                assert!((10..100).contains(&profile.number_of_requests));
            }
        }
    }

    #[test]
    fn post_counts_stay_within_conditioned_bounds() {
        let profiles = generate_profiles(&sample_degrees(), FAKE_DEGREE_THRESHOLD);
        for profile in &profiles {
            if profile.label == 1 {
                // base [50,200) + bonus [100,300)
                assert!((150..500).contains(&profile.number_of_posts));
            } else {
                // base [50,500) + bonus [50,150)
                assert!((100..650).contains(&profile.number_of_posts));
            }
        }
    }

    #[test]
    fn account_age_is_bounded_noise() {
        let profiles = generate_profiles(&sample_degrees(), FAKE_DEGREE_THRESHOLD);
        assert!(
            profiles
                .iter()
                .all(|p| (30..365).contains(&p.account_age_days))
        );
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let degrees = sample_degrees();
        let first = generate_profiles(&degrees, FAKE_DEGREE_THRESHOLD);
        let second = generate_profiles(&degrees, FAKE_DEGREE_THRESHOLD);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.number_of_posts, b.number_of_posts);
            assert_eq!(a.number_of_requests, b.number_of_requests);
            assert_eq!(a.account_age_days, b.account_age_days);
        }
    }
}
