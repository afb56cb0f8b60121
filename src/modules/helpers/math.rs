pub struct Math {}

impl Math {
    pub fn mean(nums: &[f64]) -> Option<f64> {
        if nums.is_empty() {
            return None;
        }

        let sum: f64 = nums.iter().sum();
        Some(sum / nums.len() as f64)
    }

    pub fn median(nums: &[f64]) -> Option<f64> {
        if nums.is_empty() {
            return None;
        }

        let mut nums = nums.to_vec();
        nums.sort_by(|a, b| a.total_cmp(b));

        // even lengths take the average of the two middle elements
        let middle = nums.len() / 2;
        if nums.len() % 2 == 0 {
            Some((nums[middle - 1] + nums[middle]) / 2.0)
        } else {
            Some(nums[middle])
        }
    }

    pub fn minimum(nums: &[f64]) -> Option<f64> {
        nums.iter().copied().min_by(|a, b| a.total_cmp(b))
    }
}
