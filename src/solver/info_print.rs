use crate::algebra::*;
use crate::io::{ConfigurablePrintTarget, PrintTarget};
use crate::solver::{AdmmInfo, AdmmSettings, AdmmSolution, ProblemData};
use crate::timers::Timers;
use std::io::Write;
use std::time::Duration;

impl<T> ConfigurablePrintTarget for AdmmInfo<T> {
    fn print_to_stdout(&mut self) {
        self.stream.print_to_stdout()
    }
    fn print_to_file(&mut self, file: std::fs::File) {
        self.stream.print_to_file(file)
    }
    fn print_to_stream(&mut self, stream: Box<dyn Write + Send + Sync>) {
        self.stream.print_to_stream(stream)
    }
    fn print_to_sink(&mut self) {
        self.stream.print_to_sink()
    }
    fn print_to_buffer(&mut self) {
        self.stream.print_to_buffer()
    }
    fn get_print_buffer(&mut self) -> std::io::Result<String> {
        self.stream.get_print_buffer()
    }
}

macro_rules! expformat {
    ($fmt:expr,$val:expr) => {
        if $val.is_finite() {
            _exp_str_reformat(format!($fmt, $val))
        } else {
            format!($fmt, $val)
        }
    };
}

const RULE: &str = "-----------------------------------------------------------------";

impl<T> AdmmInfo<T>
where
    T: FloatT,
{
    pub(crate) fn print_banner(&mut self, settings: &AdmmSettings<T>) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }
        let out = &mut self.stream;
        writeln!(out, "{RULE}")?;
        writeln!(
            out,
            "        lpadmm v{}  -  consensus ADMM for soft margin LPs",
            crate::VERSION
        )?;
        writeln!(out, "{RULE}")?;
        Ok(())
    }

    pub(crate) fn print_configuration(
        &mut self,
        settings: &AdmmSettings<T>,
        data: &ProblemData<T>,
    ) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }

        let out = &mut self.stream;

        writeln!(out, "\nproblem:")?;
        writeln!(out, "  features (p)  = {}", data.p)?;
        writeln!(out, "  points (n)    = {}", data.n)?;
        writeln!(out, "  box bound (D) = {:.4}", data.D)?;
        _print_partitions(out, &self.partition_sizes)?;
        writeln!(out,)?;

        let set = settings;
        writeln!(out, "settings:")?;
        write!(out, "  linear algebra: direct / qdldl, precision: {} bit ", _get_precision_string::<T>())?;
        _print_parallel(out, set.parallel, self.partition_sizes.len())?;
        writeln!(out)?;
        writeln!(
            out,
            "  ρ = {:.3e}, η = {:.3}, max iter = {}",
            set.rho, set.eta, set.max_iter
        )?;
        writeln!(
            out,
            "  tol = {:.1e}, reltol = {:.1e}, seed = {}",
            set.tol, set.reltol, set.partition_seed
        )?;
        writeln!(
            out,
            "  static reg : ϵ = {:.1e}, iter refine: reltol = {:.1e}, abstol = {:.1e}, max iter = {}",
            set.kkt_static_reg, set.kkt_refine_reltol, set.kkt_refine_abstol, set.kkt_refine_max_iter
        )?;
        writeln!(
            out,
            "  line search: forced = {}, deep after {} iter, max bisect = {}",
            _bool_on_off(set.force_linesearch),
            set.linesearch_deep_min_iter,
            set.linesearch_max_bisect
        )?;
        writeln!(
            out,
            "  dual recovery: {}, margin tol = {:.1e}, residual check = {} ({:.1e})",
            _bool_on_off(set.recover_duals),
            set.dual_margin_tol,
            _bool_on_off(set.dual_check_residual),
            set.dual_recovery_tol
        )?;
        writeln!(out,)?;
        Ok(())
    }

    pub(crate) fn print_status_header(&mut self, settings: &AdmmSettings<T>) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }

        let out = &mut self.stream;

        write!(out, "iter    ")?;
        write!(out, "objective    ")?;
        write!(out, "r_norm    ")?;
        write!(out, "eps_pri   ")?;
        write!(out, "s_norm    ")?;
        write!(out, "eps_dual  ")?;
        writeln!(out,)?;
        writeln!(out, "{RULE}")?;
        out.flush()?;
        Ok(())
    }

    pub(crate) fn print_status(&mut self, settings: &AdmmSettings<T>) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }

        let out = &mut self.stream;

        write!(out, "{:>4}  ", self.iterations)?;
        write!(out, "{}  ", expformat!("{:+8.4e}", self.objective))?;
        write!(out, "{}  ", expformat!("{:6.2e}", self.r_norm))?;
        write!(out, "{}  ", expformat!("{:6.2e}", self.eps_pri))?;
        write!(out, "{}  ", expformat!("{:6.2e}", self.s_norm))?;
        write!(out, "{}  ", expformat!("{:6.2e}", self.eps_dual))?;
        writeln!(out,)?;

        Ok(())
    }

    pub(crate) fn print_footer(
        &mut self,
        settings: &AdmmSettings<T>,
        solution: &AdmmSolution<T>,
        timers: &Timers,
    ) -> std::io::Result<()> {
        if !settings.verbose {
            return Ok(());
        }

        let out = &mut self.stream;

        writeln!(out, "{RULE}")?;
        writeln!(
            out,
            "Terminated with status = {} (exitflag {})",
            self.status, solution.exitflag
        )?;
        writeln!(out, "iterations = {}", solution.iterations)?;
        writeln!(
            out,
            "objective  = {}, threshold = {}",
            expformat!("{:+.6e}", solution.obj_val),
            expformat!("{:+.6e}", solution.primal.threshold)
        )?;

        if let Some(ref ls) = self.linesearch {
            write!(out, "line search: {}", ls.strategy)?;
            if ls.deep_failed {
                write!(out, " (no oscillation found)")?;
            }
            if ls.adopted {
                writeln!(out, ", improvement = {}", expformat!("{:.3e}", ls.improvement))?;
            } else {
                writeln!(out, ", not adopted")?;
            }
        }

        if let Some(ref dual) = solution.dual {
            writeln!(
                out,
                "dual recovery: β = {}, residual = {}",
                expformat!("{:+.6e}", dual.beta),
                expformat!("{:.2e}", dual.residual)
            )?;
        }

        writeln!(
            out,
            "solve time = {:?}",
            Duration::from_secs_f64(self.solve_time)
        )?;
        timers.print(out)?;
        out.flush()?;

        Ok(())
    }
}

fn _bool_on_off(v: bool) -> &'static str {
    match v {
        true => "on",
        false => "off",
    }
}

fn _print_parallel(out: &mut PrintTarget, parallel: bool, npar: usize) -> std::io::Result<()> {
    if !cfg!(feature = "parallel") || !parallel || npar == 1 {
        return write!(out, "(serial)");
    }
    write!(out, "(parallel over {npar} partitions)")
}

fn _print_partitions(out: &mut PrintTarget, sizes: &[usize]) -> std::io::Result<()> {
    let maxlistlen = 5;
    let count = sizes.len();

    write!(out, "  partitions    = {count}, ")?;

    if count == 1 {
        write!(out, " size = {}", sizes[0])?;
    } else if count <= maxlistlen {
        write!(out, " sizes = (")?;
        for s in sizes.iter().take(count - 1) {
            write!(out, "{s},")?;
        }
        write!(out, "{})", sizes[count - 1])?;
    } else {
        write!(out, " sizes = (")?;
        for s in sizes.iter().take(maxlistlen - 1) {
            write!(out, "{s},")?;
        }
        write!(out, "...,{})", sizes[count - 1])?;
    }

    writeln!(out,)
}

fn _get_precision_string<T: FloatT>() -> String {
    (::std::mem::size_of::<T>() * 8).to_string()
}

// convert a string in LowerExp display format into one that
// 1) always has a sign after the exponent, and
// 2) has at least two digits in the exponent.

fn _exp_str_reformat(mut thestr: String) -> String {
    let Some(eidx) = thestr.find('e') else {
        return thestr;
    };
    let has_sign = thestr[eidx + 1..].starts_with('-');

    let has_short_exp = {
        if !has_sign {
            thestr.len() == eidx + 2
        } else {
            thestr.len() == eidx + 3
        }
    };

    let chars = match (has_sign, has_short_exp) {
        (false, true) => "+0",
        (false, false) => "+",
        (true, true) => "0",
        (true, false) => "",
    };

    let shift = if has_sign { 2 } else { 1 };
    thestr.insert_str(eidx + shift, chars);
    thestr
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_str_reformat() {
        assert_eq!(_exp_str_reformat(format!("{:.2e}", 1.5e-3)), "1.50e-03");
        assert_eq!(_exp_str_reformat(format!("{:.2e}", 1.5e3)), "1.50e+03");
        assert_eq!(_exp_str_reformat(format!("{:.2e}", 1.5e-12)), "1.50e-12");
        assert_eq!(_exp_str_reformat(format!("{:+.1e}", -2.0)), "-2.0e+00");
    }

    #[test]
    fn test_print_partitions() {
        let mut out = PrintTarget::Buffer(Vec::new());
        _print_partitions(&mut out, &[3, 2, 2]).unwrap();
        _print_partitions(&mut out, &[1, 1, 1, 1, 1, 1, 2]).unwrap();
        let text = out.get_print_buffer().unwrap();
        assert!(text.contains("partitions    = 3,  sizes = (3,2,2)"));
        assert!(text.contains("sizes = (1,1,1,1,...,2)"));
    }
}
