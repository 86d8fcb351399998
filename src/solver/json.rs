#![allow(non_snake_case)]

use crate::algebra::*;
use crate::solver::{AdmmSettings, AdmmSolver};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::io::Write;
use std::{fs::File, io, io::Read};

/// Reading and writing of problem data and settings as JSON
pub trait SolverJSONReadWrite<T: FloatT>: Sized {
    /// Write the problem data and settings to `file`
    fn write_to_file(&self, file: &mut File) -> Result<(), io::Error>;
    /// Create a solver from a file written by `write_to_file`.  Settings
    /// given here replace the ones stored in the file.
    fn read_from_file(file: &mut File, settings: Option<AdmmSettings<T>>) -> Result<Self, io::Error>;
}

// Only the data provided by the user, i.e. no partitions or factors.

#[derive(Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
struct JsonProblemData<T: FloatT> {
    pub H: Matrix<T>,
    pub D: T,
    pub settings: AdmmSettings<T>,
}

impl<T> SolverJSONReadWrite<T> for AdmmSolver<T>
where
    T: FloatT + DeserializeOwned + Serialize,
{
    fn write_to_file(&self, file: &mut File) -> Result<(), io::Error> {
        let json_data = JsonProblemData {
            H: self.data.H.clone(),
            D: self.data.D,
            settings: self.settings.clone(),
        };

        let json = serde_json::to_string(&json_data)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }

    fn read_from_file(file: &mut File, settings: Option<AdmmSettings<T>>) -> Result<Self, io::Error> {
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        let json_data: JsonProblemData<T> = serde_json::from_str(&buffer)?;

        let settings = settings.unwrap_or(json_data.settings);

        Self::new(&json_data.H, json_data.D, settings)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[test]
fn test_json_io() {
    use std::io::{Seek, SeekFrom};

    let H = Matrix::from(&[[1., 2., 3.], [3., 2., 1.]]);
    let settings = crate::solver::AdmmSettingsBuilder::default()
        .max_iter(50)
        .build()
        .unwrap();

    let mut solver = AdmmSolver::<f64>::new(&H, 0.5, settings).unwrap();
    solver.solve().unwrap();

    let mut file = tempfile::tempfile().unwrap();
    solver.write_to_file(&mut file).unwrap();

    file.seek(SeekFrom::Start(0)).unwrap();
    let mut solver2 = AdmmSolver::<f64>::read_from_file(&mut file, None).unwrap();
    solver2.solve().unwrap();
    assert_eq!(solver.solution.primal, solver2.solution.primal);
    assert_eq!(solver2.settings().max_iter, 50);
}
