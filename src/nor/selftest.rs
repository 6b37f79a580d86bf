//! Board bring-up test for the external NOR flash
//!
//! Checks the array layout the driver reports, erases a sector, programs a
//! pattern and reads it back, then checks that the chip goes quiet in deep
//! power down and comes back from it.

use super::{DeepPowerDown, EraseSize, Geometry, MemoryMapped, NorFlash};

/// Not page aligned, the pattern straddles several pages
pub const TEST_ADDRESS: u32 = 0x50;
pub const PATTERN_LEN: usize = 1024;
const PATTERN_SEED: u8 = 0xD2;

/// Receives the progress of the test, for a display or a log
pub trait StatusSink {
    fn step(&mut self, name: &str);
    fn passed(&mut self);
    fn failed(&mut self, reason: &str);
}

/// A sink that drops everything
impl StatusSink for () {
    fn step(&mut self, _name: &str) {}
    fn passed(&mut self) {}
    fn failed(&mut self, _reason: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    Geometry,
    Erase,
    Write,
    Read,
    MemoryMapped,
    EnterDeepPowerDown,
    ReadInDeepPowerDown,
    LeaveDeepPowerDown,
    ReadAfterWakeUp,
}

impl Step {
    pub const fn name(&self) -> &'static str {
        match self {
            Step::Geometry => "geometry",
            Step::Erase => "erase",
            Step::Write => "write",
            Step::Read => "read",
            Step::MemoryMapped => "memory mapped read",
            Step::EnterDeepPowerDown => "enter deep power down",
            Step::ReadInDeepPowerDown => "read in deep power down",
            Step::LeaveDeepPowerDown => "leave deep power down",
            Step::ReadAfterWakeUp => "read after wake up",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelftestError<E> {
    /// The flash driver returned an error
    Flash { step: Step, error: E },
    /// Data read back differs from the pattern, at `offset`
    Mismatch { step: Step, offset: usize },
    /// The chip answered with the pattern while it should have been powered down
    NotPoweredDown,
    /// The driver reports another layout than the board expects
    Geometry(Geometry),
}

impl<E> SelftestError<E> {
    pub fn step(&self) -> Step {
        match self {
            SelftestError::Flash { step, .. } | SelftestError::Mismatch { step, .. } => *step,
            SelftestError::NotPoweredDown => Step::ReadInDeepPowerDown,
            SelftestError::Geometry(_) => Step::Geometry,
        }
    }
}

pub fn pattern() -> [u8; PATTERN_LEN] {
    core::array::from_fn(|i| (i as u8).wrapping_add(PATTERN_SEED))
}

/// The pattern must sit in the first sector, pages and sectors must tile blocks
fn fits_test_area(g: &Geometry) -> bool {
    let pattern_end = TEST_ADDRESS as u64 + PATTERN_LEN as u64;
    g.page_size.is_power_of_two()
        && g.sector_size.is_power_of_two()
        && g.block_size.is_power_of_two()
        && g.page_size <= g.sector_size
        && g.sector_size <= g.block_size
        && g.capacity % g.block_size == 0
        && pattern_end <= g.sector_size as u64
        && g.capacity != 0
}

fn first_mismatch(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter().zip(b).position(|(x, y)| x != y)
}

struct Runner<'a, F, K> {
    flash: &'a mut F,
    sink: &'a mut K,
}

impl<'a, F: NorFlash, K: StatusSink> Runner<'a, F, K> {
    /// Runs one step, reporting it to the sink
    fn run<T>(
        &mut self,
        step: Step,
        f: impl FnOnce(&mut F) -> Result<T, SelftestError<F::Error>>,
    ) -> Result<T, SelftestError<F::Error>> {
        self.sink.step(step.name());
        let res = f(&mut *self.flash);
        match &res {
            Ok(_) => self.sink.passed(),
            Err(SelftestError::Flash { .. }) => self.sink.failed("flash error"),
            Err(SelftestError::Mismatch { .. }) => self.sink.failed("data mismatch"),
            Err(SelftestError::NotPoweredDown) => self.sink.failed("chip still answering"),
            Err(SelftestError::Geometry(_)) => self.sink.failed("unexpected geometry"),
        }
        res
    }

    fn geometry(&mut self, expected: &Geometry) -> Result<(), SelftestError<F::Error>> {
        self.run(Step::Geometry, |flash| {
            let geometry = flash.geometry();
            if geometry == *expected && fits_test_area(&geometry) {
                Ok(())
            } else {
                Err(SelftestError::Geometry(geometry))
            }
        })
    }

    fn read_compare(&mut self, step: Step, expected: &[u8; PATTERN_LEN]) -> Result<(), SelftestError<F::Error>> {
        self.run(step, |flash| {
            let mut buf = [0; PATTERN_LEN];
            flash
                .read(TEST_ADDRESS, &mut buf)
                .map_err(|error| SelftestError::Flash { step, error })?;
            match first_mismatch(&buf, expected) {
                Some(offset) => Err(SelftestError::Mismatch { step, offset }),
                None => Ok(()),
            }
        })
    }

    fn program(&mut self, expected: &[u8; PATTERN_LEN]) -> Result<(), SelftestError<F::Error>> {
        self.run(Step::Erase, |flash| {
            flash
                .erase_block(TEST_ADDRESS, EraseSize::Sector4K)
                .map_err(|error| SelftestError::Flash {
                    step: Step::Erase,
                    error,
                })
        })?;
        self.run(Step::Write, |flash| {
            flash
                .write(TEST_ADDRESS, expected)
                .map_err(|error| SelftestError::Flash {
                    step: Step::Write,
                    error,
                })
        })?;
        self.read_compare(Step::Read, expected)
    }
}

impl<'a, F: DeepPowerDown, K: StatusSink> Runner<'a, F, K> {
    fn power_cycle(&mut self, expected: &[u8; PATTERN_LEN]) -> Result<(), SelftestError<F::Error>> {
        self.run(Step::EnterDeepPowerDown, |flash| {
            flash
                .enter_deep_power_down()
                .map_err(|error| SelftestError::Flash {
                    step: Step::EnterDeepPowerDown,
                    error,
                })
        })?;
        // a powered down chip ignores the read, a bus error is just as good
        self.run(Step::ReadInDeepPowerDown, |flash| {
            let mut buf = [0; PATTERN_LEN];
            match flash.read(TEST_ADDRESS, &mut buf) {
                Ok(()) if buf == *expected => Err(SelftestError::NotPoweredDown),
                _ => Ok(()),
            }
        })?;
        self.run(Step::LeaveDeepPowerDown, |flash| {
            flash
                .leave_deep_power_down()
                .map_err(|error| SelftestError::Flash {
                    step: Step::LeaveDeepPowerDown,
                    error,
                })
        })?;
        self.read_compare(Step::ReadAfterWakeUp, expected)
    }
}

/// Geometry check against `geometry`, erase, program and verify, then a deep
/// power down cycle
pub fn run<F, K>(flash: &mut F, geometry: &Geometry, sink: &mut K) -> Result<(), SelftestError<F::Error>>
where
    F: DeepPowerDown,
    K: StatusSink,
{
    let expected = pattern();
    let mut runner = Runner { flash, sink };
    runner.geometry(geometry)?;
    runner.program(&expected)?;
    runner.power_cycle(&expected)
}

/// Like [`run`], with a compare through the memory mapped window after programming
pub fn run_memory_mapped<F, K>(
    flash: &mut F,
    geometry: &Geometry,
    sink: &mut K,
) -> Result<(), SelftestError<F::Error>>
where
    F: DeepPowerDown + MemoryMapped,
    K: StatusSink,
{
    let expected = pattern();
    let mut runner = Runner { flash, sink };
    runner.geometry(geometry)?;
    runner.program(&expected)?;
    runner.run(Step::MemoryMapped, |flash| {
        let mapped = flash.memory_mapped().map_err(|error| SelftestError::Flash {
            step: Step::MemoryMapped,
            error,
        })?;
        let start = TEST_ADDRESS as usize;
        let window = mapped.get(start..start + PATTERN_LEN).unwrap_or(&[]);
        match first_mismatch(window, &expected) {
            Some(offset) => Err(SelftestError::Mismatch {
                step: Step::MemoryMapped,
                offset,
            }),
            None if window.len() < PATTERN_LEN => Err(SelftestError::Mismatch {
                step: Step::MemoryMapped,
                offset: window.len(),
            }),
            None => Ok(()),
        }
    })?;
    runner.power_cycle(&expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_wraps() {
        let p = pattern();
        assert_eq!(p[0], 0xD2);
        assert_eq!(p[0x2D], 0xFF);
        assert_eq!(p[0x2E], 0x00);
    }

    #[test]
    fn test_area() {
        let mx25 = crate::nor::mx25lm51245g::GEOMETRY;
        assert!(fits_test_area(&mx25));
        assert!(!fits_test_area(&Geometry { page_size: 300, ..mx25 }));
        assert!(!fits_test_area(&Geometry { capacity: 0, ..mx25 }));
        assert!(!fits_test_area(&Geometry { capacity: 96 * 1024 + 1, ..mx25 }));
        assert!(!fits_test_area(&Geometry { sector_size: 512, ..mx25 }));
    }

    #[test]
    fn mismatch_offset() {
        assert_eq!(first_mismatch(&[1, 2, 3], &[1, 2, 3]), None);
        assert_eq!(first_mismatch(&[1, 2, 3], &[1, 0, 3]), Some(1));
    }
}
