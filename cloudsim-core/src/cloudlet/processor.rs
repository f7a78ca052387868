//! A per-tick snapshot of the PE count and per-PE MIPS capacity a VM's
//! scheduler was handed (`spec.md` §4.3 step 1).

pub struct Processor {
    pub mips_share: Vec<f64>,
}

impl Processor {
    pub fn from_mips_share(mips_share: &[f64]) -> Self {
        Self {
            mips_share: mips_share.to_vec(),
        }
    }

    pub fn pe_count(&self) -> usize {
        self.mips_share.len()
    }

    pub fn total_mips(&self) -> f64 {
        self.mips_share.iter().sum()
    }

    pub fn max_mips_per_pe(&self) -> f64 {
        self.mips_share.iter().cloned().fold(0.0, f64::max)
    }
}
