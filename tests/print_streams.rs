#![allow(non_snake_case)]

use lpadmm::{algebra::*, io::ConfigurablePrintTarget, solver::*};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

fn verbose_solver(verbose: bool) -> AdmmSolver<f64> {
    let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
    let settings = AdmmSettingsBuilder::default()
        .max_iter(10)
        .tol(1e-8)
        .reltol(1e-6)
        .verbose(verbose)
        .build()
        .unwrap();
    AdmmSolver::new(&H, 0.5, settings).unwrap()
}

#[test]
fn test_print_to_buffer() {
    let mut solver = verbose_solver(true);
    solver.print_to_buffer();
    solver.solve().unwrap();

    let text = solver.get_print_buffer().unwrap();
    assert!(text.contains("lpadmm v"));
    assert!(text.contains("partitions    = 1"));
    assert!(text.contains("iter    objective"));
    assert!(text.contains("Terminated with status = "));
    assert!(text.contains("line search: Shallow"));
    // one status line per iteration
    let ncols = text
        .lines()
        .filter(|l| l.trim_start().starts_with(|c: char| c.is_ascii_digit()))
        .count();
    assert_eq!(ncols, solver.solution.iterations as usize);
}

#[test]
fn test_quiet_prints_nothing() {
    let mut solver = verbose_solver(false);
    solver.print_to_buffer();
    solver.solve().unwrap();
    assert!(solver.get_print_buffer().unwrap().is_empty());
}

#[test]
fn test_print_to_file() {
    let mut solver = verbose_solver(true);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    solver.print_to_file(file.reopen().unwrap());
    solver.solve().unwrap();

    let mut text = String::new();
    file.read_to_string(&mut text).unwrap();
    assert!(text.contains("Terminated with status = MaxIterations"));
}

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_print_to_stream() {
    let mut solver = verbose_solver(true);
    let buffer = SharedBuffer::default();
    solver.print_to_stream(Box::new(buffer.clone()));
    solver.solve().unwrap();

    let bytes = buffer.0.lock().unwrap().clone();
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("iter    objective"));

    // no buffer behind a stream
    assert!(solver.get_print_buffer().is_err());
}

#[test]
fn test_print_to_sink() {
    let mut solver = verbose_solver(true);
    solver.print_to_sink();
    solver.solve().unwrap();
    assert!(solver.get_print_buffer().is_err());
}
