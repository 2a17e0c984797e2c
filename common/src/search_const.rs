//! Navigation constants shared by the codec and the backend.

pub const DEFAULT_PAGE_SIZE: u64 = 100;

pub const MAX_PAGE_SIZE: u64 = 1000;

pub const MONTH_NAMES: [&str; 13] = [
    "", "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

pub fn month_name(month: u32) -> Option<&'static str> {
    match month {
        1..=12 => Some(MONTH_NAMES[month as usize]),
        _ => None,
    }
}
