pub mod bench;

#[inline]
pub const fn next_multiple(n: usize, of: usize) -> usize {
    let rem = n % of;
    if rem == 0 {
        n
    } else {
        n + (of - rem)
    }
}

#[cfg(test)]
mod test {
    use super::next_multiple;

    #[test]
    fn test_next_multiple() {
        assert_eq!(next_multiple(0, 8), 0);
        assert_eq!(next_multiple(5, 8), 8);
        assert_eq!(next_multiple(16, 8), 16);
        assert_eq!(next_multiple(17, 4), 20);
    }
}
