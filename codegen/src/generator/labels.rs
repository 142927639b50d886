
use tracing::trace;

pub(crate) struct LabelGenerator {
    label_count: usize,
}

impl LabelGenerator {
    pub fn new() -> Self {
        LabelGenerator {label_count: 0}
    }

    /* Labels are numbered from 1 and carry the construct they belong to. */
    pub fn new_label(&mut self, context: &str) -> String {
        self.label_count += 1;
        let label = format!("label{}_{}", self.label_count, context);
        trace!(%label, "allocated label");
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_unique_and_numbered_from_one() {
        let mut labels = LabelGenerator::new();
        assert_eq!(labels.new_label("startWhile"), "label1_startWhile");
        assert_eq!(labels.new_label("endWhile"), "label2_endWhile");
        assert_eq!(labels.new_label("else"), "label3_else");
    }
}
