/// Deterministic prompt generation for variable-length latency sweeps.
use crate::error::AppError;

/// Character used to pad prompts up to their target length.
const PAD_CHAR: char = 'X';

/// Generate `n_prompts` prompts whose target lengths are evenly spaced
/// integers between `min_length` and `max_length` inclusive.
///
/// Each prompt is `base_prompt` padded with filler characters up to its
/// target; a base prompt already longer than the target is left untouched.
/// Pure and deterministic given its inputs.
pub fn variable_length_prompts(
    base_prompt: &str,
    n_prompts: usize,
    min_length: usize,
    max_length: usize,
) -> Result<Vec<String>, AppError> {
    if n_prompts == 0 {
        return Err(AppError::Config(
            "n_prompts must be greater than zero".to_string(),
        ));
    }
    if min_length > max_length {
        return Err(AppError::Config(format!(
            "min_length ({}) must not exceed max_length ({})",
            min_length, max_length
        )));
    }

    let base_chars = base_prompt.chars().count();
    let mut prompts = Vec::with_capacity(n_prompts);

    for i in 0..n_prompts {
        let target = spaced_length(min_length, max_length, n_prompts, i);
        let padding = target.saturating_sub(base_chars);
        let mut prompt = String::with_capacity(base_prompt.len() + padding);
        prompt.push_str(base_prompt);
        for _ in 0..padding {
            prompt.push(PAD_CHAR);
        }
        prompts.push(prompt);
    }

    Ok(prompts)
}

/// The i-th of `n` evenly spaced integer lengths across [min, max].
fn spaced_length(min: usize, max: usize, n: usize, i: usize) -> usize {
    if n == 1 {
        return min;
    }
    let step = (max - min) as f64 / (n - 1) as f64;
    min + (step * i as f64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lengths_are_evenly_spaced() {
        let prompts = variable_length_prompts("explain X", 5, 100, 500).unwrap();
        let lengths: Vec<usize> = prompts.iter().map(|p| p.chars().count()).collect();
        assert_eq!(lengths, vec![100, 200, 300, 400, 500]);
        for prompt in &prompts {
            assert!(prompt.starts_with("explain X"));
        }
    }

    #[test]
    fn single_prompt_uses_min_length() {
        let prompts = variable_length_prompts("hi", 1, 50, 1000).unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts[0].chars().count(), 50);
    }

    #[test]
    fn long_base_prompt_is_not_truncated() {
        let base = "a".repeat(300);
        let prompts = variable_length_prompts(&base, 3, 100, 200).unwrap();
        for prompt in &prompts {
            assert_eq!(prompt.chars().count(), 300);
            assert_eq!(prompt, &base);
        }
    }

    #[test]
    fn equal_bounds_produce_uniform_lengths() {
        let prompts = variable_length_prompts("q", 4, 64, 64).unwrap();
        for prompt in &prompts {
            assert_eq!(prompt.chars().count(), 64);
        }
    }

    #[test]
    fn deterministic_across_calls() {
        let a = variable_length_prompts("base", 7, 10, 99).unwrap();
        let b = variable_length_prompts("base", 7, 10, 99).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_prompts_is_invalid() {
        let result = variable_length_prompts("base", 0, 10, 20);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn inverted_bounds_are_invalid() {
        let result = variable_length_prompts("base", 3, 20, 10);
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
