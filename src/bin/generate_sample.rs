use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in [lo, hi).
    fn range(&mut self, lo: u64, hi: u64) -> u64 {
        lo + self.next_u64() % (hi - lo)
    }
}

struct Institution {
    name: &'static str,
    funding: &'static str,
    region: &'static str,
    levels: &'static [&'static str],
    /// Rough size multiplier so market shares differ visibly.
    weight: f64,
}

const INSTITUTIONS: &[Institution] = &[
    Institution {
        name: "UNIVERSIDAD DE LAS AMERICAS",
        funding: "PARTICULAR",
        region: "SIERRA",
        levels: &["TERCER NIVEL", "CUARTO NIVEL"],
        weight: 1.8,
    },
    Institution {
        name: "UNIVERSIDAD CENTRAL",
        funding: "PUBLICA",
        region: "SIERRA",
        levels: &["TERCER NIVEL", "CUARTO NIVEL"],
        weight: 3.0,
    },
    Institution {
        name: "UNIVERSIDAD DEL PACIFICO",
        funding: "PARTICULAR",
        region: "COSTA",
        levels: &["TERCER NIVEL"],
        weight: 1.2,
    },
    Institution {
        name: "UNIVERSIDAD AMAZONICA",
        funding: "COFINANCIADA",
        region: "ORIENTE",
        levels: &["TERCER NIVEL"],
        weight: 0.6,
    },
    Institution {
        name: "INSTITUTO TECNOLOGICO ANDINO",
        funding: "PUBLICA",
        region: "SIERRA",
        levels: &["TECNICO"],
        weight: 0.8,
    },
    Institution {
        name: "INSTITUTO DEL LITORAL",
        funding: "PARTICULAR",
        region: "COSTA",
        levels: &["TECNICO"],
        weight: 0.5,
    },
];

const FACULTIES: &[(&str, &[&str])] = &[
    ("INGENIERIA", &["SISTEMAS", "CIVIL", "INDUSTRIAL"]),
    ("MEDICINA", &["MEDICINA GENERAL", "ENFERMERIA"]),
    ("CIENCIAS SOCIALES", &["DERECHO", "ECONOMIA", "PSICOLOGIA"]),
    ("TECNOLOGIA", &["REDES", "MECATRONICA"]),
];

const YEARS: [i64; 5] = [2019, 2020, 2021, 2022, 2023];

fn main() {
    let mut rng = SimpleRng::new(42);

    let mut years: Vec<i64> = Vec::new();
    let mut regions: Vec<&str> = Vec::new();
    let mut fundings: Vec<&str> = Vec::new();
    let mut levels: Vec<&str> = Vec::new();
    let mut faculties: Vec<&str> = Vec::new();
    let mut programs: Vec<&str> = Vec::new();
    let mut institutions: Vec<&str> = Vec::new();
    let mut enrolled: Vec<i64> = Vec::new();

    for &year in &YEARS {
        for institution in INSTITUTIONS {
            for &level in institution.levels {
                for &(faculty, careers) in FACULTIES {
                    for &career in careers {
                        // Not every institution offers every career.
                        if rng.next_f64() < 0.35 {
                            continue;
                        }
                        let base = match level {
                            "TECNICO" => rng.range(20, 120),
                            "CUARTO NIVEL" => rng.range(10, 60),
                            _ => rng.range(40, 400),
                        };
                        let count = (base as f64 * institution.weight) as i64;

                        years.push(year);
                        regions.push(institution.region);
                        fundings.push(institution.funding);
                        levels.push(level);
                        faculties.push(faculty);
                        programs.push(career);
                        institutions.push(institution.name);
                        enrolled.push(count);
                    }
                }
            }
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("AÑO", DataType::Int64, false),
        Field::new("REGION", DataType::Utf8, false),
        Field::new("FINANCIAMIENTO", DataType::Utf8, false),
        Field::new("NIVEL", DataType::Utf8, false),
        Field::new("FACULTAD", DataType::Utf8, false),
        Field::new("CARRERA", DataType::Utf8, false),
        Field::new("UNIVERSIDAD", DataType::Utf8, false),
        Field::new("MATRICULADOS", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from(years.clone())),
            Arc::new(StringArray::from(regions)),
            Arc::new(StringArray::from(fundings)),
            Arc::new(StringArray::from(levels)),
            Arc::new(StringArray::from(faculties)),
            Arc::new(StringArray::from(programs)),
            Arc::new(StringArray::from(institutions)),
            Arc::new(Int64Array::from(enrolled)),
        ],
    )
    .expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_enrollment.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    println!(
        "Wrote {} enrollment records across {} years to {output_path}",
        years.len(),
        YEARS.len()
    );
}
