// Word frequencies of a free-text (or multi-select) question.

use crate::survey::*;

/// Counts the words of the answers to one question.
///
/// Words are the runs of alphanumeric characters (at least two of them),
/// compared in lower case. The result is sorted by decreasing count, then
/// alphabetically.
pub fn word_frequencies(column: &str, records: &[Record], delimiter: char) -> Vec<(String, u64)> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for r in records {
        let answer = match r.get(column) {
            Some(a) => a,
            None => continue,
        };
        for token in answer.split(delimiter) {
            for word in token.split(|c: char| !c.is_alphanumeric()) {
                if word.chars().count() < 2 {
                    continue;
                }
                *counts.entry(word.to_lowercase()).or_insert(0) += 1;
            }
        }
    }
    let mut res: Vec<(String, u64)> = counts.into_iter().collect();
    res.sort_by(|(w1, c1), (w2, c2)| c2.cmp(c1).then_with(|| w1.cmp(w2)));
    res
}

pub fn words_to_json(question: &str, words: &[(String, u64)]) -> JSValue {
    let l: Vec<JSValue> = words
        .iter()
        .map(|(w, c)| json!({"word": w, "count": c}))
        .collect();
    json!({"question": question, "words": l})
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(v: &str) -> Record {
        Record::new(None, vec![("4. Hobbies".to_string(), v.to_string())])
    }

    #[test]
    fn counts() {
        let records = vec![
            rec("Lesen;Fußball spielen"),
            rec("lesen;Musik"),
            rec("Musik, Fußball & mehr"),
            rec(""),
        ];
        let words = word_frequencies("4. Hobbies", &records, ';');
        assert_eq!(
            words,
            vec![
                ("fußball".to_string(), 2),
                ("lesen".to_string(), 2),
                ("musik".to_string(), 2),
                ("mehr".to_string(), 1),
                ("spielen".to_string(), 1),
            ]
        );
    }

    #[test]
    fn json_shape() {
        let js = words_to_json("4", &[("lesen".to_string(), 2)]);
        assert_eq!(js, json!({"question": "4", "words": [{"word": "lesen", "count": 2}]}));
    }
}
