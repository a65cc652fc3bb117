/// Sample Data Tool
///
/// `generateSampleRecords` returns a JSON array of 20 product records. Ids,
/// names and categories are fixed (names and categories cycle through their
/// label sets); price and stock are random on every call.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::info;

use crate::core::error::{RegistryError, ToolError};
use crate::core::registry::{InputShape, ToolArguments, ToolDescriptor, ToolRegistry};

pub const TOOL_NAME: &str = "generateSampleRecords";
pub const RECORD_COUNT: usize = 20;

pub const NAMES: [&str; 5] = ["Laptop", "Mouse", "Keyboard", "Monitor", "Headphones"];
pub const CATEGORIES: [&str; 4] = ["Electronics", "Accessories", "Peripherals", "Office"];

/// Inclusive price bounds, in cents.
pub const PRICE_MIN_CENTS: u32 = 1_000;
pub const PRICE_MAX_CENTS: u32 = 100_000;
/// Exclusive upper bound on stock.
pub const STOCK_LIMIT: u32 = 100;

/// One generated product record.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SampleRecord {
    /// 1-based position in the list
    pub id: u32,
    /// Product name, cycling through `NAMES`
    pub name: &'static str,
    /// Price with two decimal places
    pub price: f64,
    /// Category, cycling through `CATEGORIES`
    pub category: &'static str,
    /// Units in stock
    pub stock: u32,
}

/// Generate the full record list from the given RNG.
///
/// # Arguments
/// * `rng` - Source of the random price and stock values
pub fn generate_records<R: Rng>(rng: &mut R) -> Vec<SampleRecord> {
    (0..RECORD_COUNT)
        .map(|i| {
            let cents = rng.gen_range(PRICE_MIN_CENTS..=PRICE_MAX_CENTS);
            SampleRecord {
                id: i as u32 + 1,
                name: NAMES[i % NAMES.len()],
                price: f64::from(cents) / 100.0,
                category: CATEGORIES[i % CATEGORIES.len()],
                stock: rng.gen_range(0..STOCK_LIMIT),
            }
        })
        .collect()
}

/// Register the tool with an entropy-seeded RNG per call.
pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    register_with_rng(registry, StdRng::from_entropy)
}

/// Register the tool with a custom RNG factory.
///
/// The factory is called once per invocation, so a fixed seed yields the
/// same records on every call.
pub fn register_with_rng<F>(registry: &mut ToolRegistry, make_rng: F) -> Result<(), RegistryError>
where
    F: Fn() -> StdRng + Send + Sync + 'static,
{
    registry.register(
        ToolDescriptor {
            name: TOOL_NAME.to_string(),
            description: format!(
                "Generate {} sample product records with random price and stock.",
                RECORD_COUNT
            ),
            input_shape: InputShape::empty(),
        },
        Box::new(move |_: &ToolArguments| {
            let records = generate_records(&mut make_rng());
            info!(tool = TOOL_NAME, count = records.len(), "sample records generated");
            serde_json::to_value(records).map_err(|e| ToolError::Execution(e.to_string()))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn seeded(seed: u64) -> Vec<SampleRecord> {
        generate_records(&mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn generates_twenty_sequential_records() {
        let records = seeded(1);
        assert_eq!(records.len(), RECORD_COUNT);
        let ids: Vec<u32> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=20).collect::<Vec<u32>>());
    }

    #[test]
    fn labels_cycle_through_fixed_sets() {
        for (i, record) in seeded(2).iter().enumerate() {
            assert_eq!(record.name, NAMES[i % NAMES.len()]);
            assert_eq!(record.category, CATEGORIES[i % CATEGORIES.len()]);
        }
    }

    #[test]
    fn numeric_fields_stay_in_bounds() {
        for seed in 0..50 {
            for record in seeded(seed) {
                let min = f64::from(PRICE_MIN_CENTS) / 100.0;
                let max = f64::from(PRICE_MAX_CENTS) / 100.0;
                assert!(record.price >= min && record.price <= max, "{:?}", record);

                let cents = record.price * 100.0;
                assert!((cents - cents.round()).abs() < 1e-6, "{:?}", record);

                assert!(record.stock < STOCK_LIMIT, "{:?}", record);
            }
        }
    }

    #[test]
    fn different_seeds_share_sequencing() {
        let first = seeded(10);
        let second = seeded(11);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!((a.id, a.name, a.category), (b.id, b.name, b.category));
        }
        assert_ne!(first, second);
    }

    #[test]
    fn registered_tool_uses_injected_rng() {
        let mut registry = ToolRegistry::new();
        register_with_rng(&mut registry, || StdRng::seed_from_u64(42)).unwrap();

        let tool = registry.resolve(TOOL_NAME).unwrap();
        let args = tool.validate(&Value::Null).unwrap();
        let output = tool.invoke(&args).unwrap();

        assert_eq!(output, serde_json::to_value(seeded(42)).unwrap());
        assert_eq!(tool.invoke(&args).unwrap(), output);
    }

    #[test]
    fn records_serialize_with_expected_keys() {
        let value = serde_json::to_value(&seeded(3)[0]).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, ["category", "id", "name", "price", "stock"]);
        assert_eq!(value["id"], json!(1));
    }
}
