//! 实验结果.

use crate::profile::Profile;
use std::io::{self, Write};

/// 将 `profile` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, p: &Profile, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    #[inline]
    fn f64_to_display(f: Option<f64>) -> String {
        match f {
            Some(f) => format!("{f:.6}"),
            None => "/".to_string(),
        }
    }

    writeln!(w, "Profile `{name}`:")?;
    writeln!(w, "{S4}Empty o-contours: {}", p.get_trivial())?;
    writeln!(w, "{S4}Evaluated samples: {}", p.get_target())?;
    writeln!(w, "{S4}Failed batches: {}", p.get_failed())?;
    writeln!(w, "{S4}Micro IoU: {:.6}", p.get_micro_iou())?;
    writeln!(w, "{S4}Macro IoU: {}", f64_to_display(p.get_macro_iou()))?;
    writeln!(w, "{S4}Total predict time: {} us", p.get_predict_time_us())?;
    writeln!(
        w,
        "{S4}Average predict time: {} us per sample",
        f64_to_display(p.get_avg_predict_time_us())
    )?;
    writeln!(w, "{S4}Total machine time: {} us", p.get_real_time_us())?;
    let t = p.get_most_time_consuming().map(|d| d.as_micros() as f64);
    write!(w, "{S4}Slowest batch costs {} us", f64_to_display(t))?;
    Ok(())
}

/// 消融实验最终结果.
pub struct AblationResult {
    data: Vec<(String, Profile)>,
}

impl AblationResult {
    pub fn from_iter<I: IntoIterator<Item = (String, Profile)>>(it: I) -> Self {
        Self {
            data: it.into_iter().collect(),
        }
    }

    /// micro IoU 最高的设置.
    pub fn best(&self) -> Option<&str> {
        self.data
            .iter()
            .max_by(|a, b| a.1.get_micro_iou().total_cmp(&b.1.get_micro_iou()))
            .map(|(name, _)| name.as_str())
    }

    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        for (key, profile) in self.data.iter() {
            if describe_into(key, profile, &mut buf).is_ok() {
                println!("{}", String::from_utf8_lossy(&buf));
            }
            buf.clear();

            utils::sep();
        }
        if let Some(best) = self.best() {
            println!("Best setting by micro IoU: `{best}`");
        }
    }
}
