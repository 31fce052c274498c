use bitplist::{
    encode_document, from_str, from_value, parse, to_string, to_string_pretty, to_value, EncodeOptions,
    PlistMap, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Particle {
    id: u32,
    position: [f64; 3],
    velocity: [f64; 3],
    charged: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Integrator {
    Euler,
    Verlet { substeps: u8 },
    RungeKutta(u8),
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Simulation {
    name: String,
    step: u64,
    time: f64,
    integrator: Integrator,
    particles: Vec<Particle>,
    parameters: HashMap<String, f64>,
    notes: Option<String>,
}

fn simulation() -> Simulation {
    let mut parameters = HashMap::new();
    parameters.insert("gravity".to_string(), -9.81);
    parameters.insert("damping".to_string(), 1e-300);
    parameters.insert("epsilon".to_string(), f64::EPSILON);

    Simulation {
        name: "two-body".to_string(),
        step: 40_000,
        time: 0.1 * 3.0,
        integrator: Integrator::Verlet { substeps: 4 },
        particles: vec![
            Particle {
                id: 0,
                position: [0.0, -0.0, 1.0 / 7.0],
                velocity: [f64::MAX, f64::MIN_POSITIVE, -2.5],
                charged: true,
            },
            Particle {
                id: 1,
                position: [1e-320, 6.02214076e23, std::f64::consts::PI],
                velocity: [0.0, 0.0, 0.0],
                charged: false,
            },
        ],
        parameters,
        notes: Some("résumé: ∆t = 10⁻³".to_string()),
    }
}

fn same_bits(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

#[test]
fn test_simulation_roundtrip() {
    let state = simulation();
    let text = to_string(&state).unwrap();
    println!("Checkpoint: {}", text);

    let back: Simulation = from_str(&text).unwrap();
    assert_eq!(state, back);
    assert_eq!(back.time.to_bits(), (0.1f64 * 3.0).to_bits());
    for (a, b) in state.particles.iter().zip(&back.particles) {
        assert!(same_bits(&a.position, &b.position));
        assert!(same_bits(&a.velocity, &b.velocity));
    }
}

#[test]
fn test_signed_zero_survives() {
    let back: Simulation = from_str(&to_string(&simulation()).unwrap()).unwrap();
    assert!(back.particles[0].position[1].is_sign_negative());
    assert!(back.particles[0].position[0].is_sign_positive());
}

#[test]
fn test_pretty_output_is_equivalent() {
    let state = simulation();
    let compact = parse(&to_string(&state).unwrap());
    let pretty = parse(&to_string_pretty(&state).unwrap());
    assert_eq!(compact, pretty);
}

#[test]
fn test_output_is_ascii() {
    let text = to_string(&simulation()).unwrap();
    assert!(text.is_ascii());
    assert!(text.contains("r&#233;sum&#233;"));
}

#[test]
fn test_enum_representations() {
    let value = to_value(&vec![
        Integrator::Euler,
        Integrator::RungeKutta(4),
        Integrator::Verlet { substeps: 2 },
    ])
    .unwrap();
    let list = value.as_list().unwrap();
    assert_eq!(list[0], Value::from("Euler"));
    assert_eq!(list[1].get("RungeKutta"), Some(&Value::Int(4)));
    assert_eq!(
        list[2].get("Verlet").and_then(|v| v.get("substeps")),
        Some(&Value::Int(2))
    );

    let back: Vec<Integrator> = from_value(value).unwrap();
    assert_eq!(back[1], Integrator::RungeKutta(4));
}

#[test]
fn test_missing_optional_field() {
    let mut state = simulation();
    state.notes = None;
    let text = to_string(&state).unwrap();
    assert!(!text.contains("notes"));
    let back: Simulation = from_str(&text).unwrap();
    assert_eq!(back.notes, None);
}

#[test]
fn test_missing_required_field_is_error() {
    let result: bitplist::Result<Particle> = from_str("<dict><key>id</key><integer>1</integer></dict>");
    assert!(result.is_err());
}

#[test]
fn test_tree_api_roundtrip() {
    let mut cells = PlistMap::new();
    cells.insert("count".to_string(), Value::from(2));
    cells.insert(
        "mass".to_string(),
        Value::List(vec![Value::from(0.5), Value::from(f64::NAN)]),
    );

    let mut root = PlistMap::new();
    root.insert("cells".to_string(), Value::Dict(cells));
    root.insert("label".to_string(), Value::from("  padded\n"));
    root.insert("empty".to_string(), Value::List(vec![]));

    for options in [EncodeOptions::new(), EncodeOptions::pretty(), EncodeOptions::pretty().with_header(false)] {
        let text = encode_document(&root, &options);
        assert_eq!(parse(&text), root, "layout {:?}", options);
    }
}

#[test]
fn test_integer_range() {
    #[derive(Serialize)]
    struct Wide {
        counter: u64,
    }
    assert!(to_string(&Wide { counter: i32::MAX as u64 }).is_ok());
    assert!(to_string(&Wide { counter: i32::MAX as u64 + 1 }).is_err());
}

#[test]
fn test_legacy_decimal_document() {
    let text = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
                <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
                <plist version=\"1.0\">\n\
                <dict>\n\
                  <key>time</key>\n\
                  <real>0.25</real>\n\
                  <key>step</key>\n\
                  <integer>10</integer>\n\
                </dict>\n\
                </plist>\n";
    #[derive(Deserialize)]
    struct Header {
        time: f64,
        step: i32,
    }
    let header: Header = from_str(text).unwrap();
    assert_eq!(header.time, 0.25);
    assert_eq!(header.step, 10);
}
