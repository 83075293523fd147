pub fn one() {}
pub fn two() {}
pub fn three() {}
pub fn four() {}
pub fn five() {}
