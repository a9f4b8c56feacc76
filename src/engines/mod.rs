pub mod brighter_fatter;
