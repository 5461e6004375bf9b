/*
Copyright 2024 San Francisco Compute Company

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Inventory domain: records, entities, reference datasets, classification
//! and the snapshot aggregation service
//!
//! Nothing in here touches the operating system directly; probes and dataset
//! files arrive through the secondary ports.

pub mod classification;
pub mod dataset;
pub mod entities;
pub mod errors;
pub mod normalizers;
pub mod parsers;
pub mod placeholder;
pub mod records;
pub mod services;

pub use classification::{Category, ClassifiedAttribute, SourceTier};
pub use dataset::{DatasetDomain, DatasetRegistry, DatasetStatus, PciSlot};
pub use entities::*;
pub use errors::*;
pub use placeholder::PlaceholderFilter;
pub use records::{AttributeValue, ComponentKind, RawAttributeRecord};
pub use services::SnapshotAggregationService;
