pub mod memory;
pub mod seed;

pub use memory::{
    InMemoryBuildRepository, InMemoryDeviceRepository, InMemoryHostRepository,
    InMemoryJobRepository, InMemoryScheduleRepository,
};
pub use seed::{load_seed_file, SeedData, SeededStore};
