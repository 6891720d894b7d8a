// Execution mode for the distance kernel
// Allows users to choose between implementations

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    Auto,
    Simd,
    Scalar,
}

impl Default for ExecutionMode {
    fn default() -> Self {
        ExecutionMode::Auto
    }
}

impl ExecutionMode {
    // Resolve execution mode based on CPU capabilities
    pub fn resolve(&self) -> ExecutionMode {
        match self {
            ExecutionMode::Auto => {
                #[cfg(target_arch = "x86_64")]
                {
                    if is_x86_feature_detected!("avx2") {
                        ExecutionMode::Simd
                    } else {
                        ExecutionMode::Scalar
                    }
                }

                #[cfg(target_arch = "aarch64")]
                {
                    if std::arch::is_aarch64_feature_detected!("neon") {
                        ExecutionMode::Simd
                    } else {
                        ExecutionMode::Scalar
                    }
                }

                #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
                {
                    ExecutionMode::Scalar
                }
            }
            ExecutionMode::Simd => {
                #[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
                {
                    ExecutionMode::Simd
                }
                #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
                {
                    ExecutionMode::Scalar
                }
            }
            ExecutionMode::Scalar => ExecutionMode::Scalar,
        }
    }

    pub fn use_simd(&self) -> bool {
        matches!(self.resolve(), ExecutionMode::Simd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_resolves_to_concrete_mode() {
        let resolved = ExecutionMode::Auto.resolve();
        assert_ne!(resolved, ExecutionMode::Auto);
    }

    #[test]
    fn scalar_stays_scalar() {
        assert_eq!(ExecutionMode::Scalar.resolve(), ExecutionMode::Scalar);
    }
}
