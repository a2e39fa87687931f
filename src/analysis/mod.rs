pub mod marks;
pub mod representatives;

pub use marks::{mark_clusters, majority_mark, SolutionMarksHolder};
pub use representatives::{
    BagOption, CentroidPicker, FingerprintOptions, KMostFrequentPicker, ManyOptionsSelector,
    RepresentativeStrategy, RepresentativesPicker,
};
