/*!

This is the long-form manual for `crosstab` and `surveytab`.

## The chart

Each chart crosses two questions of a survey. The answers to the first question
(the x axis) form groups of bars; the answers to the second question (the y axis)
form the bins of each group. A bar is centred on the position of its group, so that
the groups read as diverging stacked bars.

Answers to multi-select questions hold several values separated by `;`. Every
value of the x answer is paired with every value of the y answer of the same
respondent. For instance, with these two respondents:

| 1. Hobbies | 2. Wie oft? |
|------------|-------------|
| A;B        | X           |
| A          | X;Y         |

the table is `A: {X: 2, Y: 1}, B: {X: 1}`. `A` was chosen by 2 respondents who
answered the second question, `B` by 1. A value selected twice in the same answer
counts once.

Each bar carries the text `66.7% (2/3)`: the share of the respondents of the
x-value, followed by the raw fraction.

### Normalization

The width of the bars follows one of two policies:

- `percentage` (default): the count divided by the number of respondents of the
  x-value, rescaled so that the largest ratio of the chart is 100. The groups are
  placed every 100 units.
- `magnitude`: each group is rescaled so that its largest bar is as wide as the
  largest count of the chart. Only the shape of each group is kept, small groups are
  amplified. The groups are placed every `largest count` units.

### Ordering

- the x axis follows the ordinal ranking
- the y axis is drawn twice: once following the ordinal ranking (`custom_sorted`),
  once by increasing number of occurrences (`sorted_by_occurrence`)

With the ordinal ranking, the labels listed in the ranking come first, by increasing
rank. The other labels follow: numbers by increasing value, then text in
alphabetical order.

## Commands

```bash
surveytab plot results.csv -x 25 -y 3
surveytab plot results.csv -x 25 -y 3 --out summary.json
surveytab plot_all results.csv
surveytab word_cloud results.csv -q 12
surveytab filter results.csv
```

Questions are designated by their identifier: the part of the column name before the
first `.`. For the column `25. Alter`, the identifier is `25`.

- `plot` writes `<x>_<y>_custom_sorted.svg` and `<x>_<y>_sorted_by_occurrence.svg`.
  With `--out`, the chart data is also written in JSON format (`--out stdout` prints
  it). With `--reference`, the chart data is compared to a previous output and the
  differences are printed.
- `plot_all` does the same for every pair of questions, in a directory named after
  the current time, which is then packed into a zip archive. Pairs that cannot be
  charted are skipped with a warning, unless `--fail-fast` is passed.
- `word_cloud` counts the words of the answers to one question and writes them to
  `wc_<id>.json`.
- `filter` writes the valid and unique results to `filtered_<input>`.

Excel files (`.xlsx`) are read as well. The first row must hold the column names. If
the file has several worksheets, pass `--excel-worksheet-name`.

The verbosity of the logs is controlled with `--verbose` or the `RUST_LOG` variable.

## Configuration

All the settings are optional and are passed as a JSON file with `--config`:

```json
{
  "inputType": "csv",
  "excelWorksheetName": "Form1",
  "timestampColumns": ["Timestamp", "Zeitstempel"],
  "consentQuestion": "1",
  "consentRejectMarker": "keine",
  "delimiter": ";",
  "ordinalRanking": [
    {"label": "immer", "rank": 12},
    {"label": "manchmal", "rank": 4},
    {"label": "nie", "rank": 1}
  ],
  "questionTransforms": {"25": "firstWord"},
  "normalization": "percentage",
  "outputDirectory": "charts",
  "chartWidth": 1366,
  "chartHeight": 768
}
```

- `timestampColumns`: the first of these columns found in the file is used as the id
  of the respondents and is not part of their answers.
- `consentQuestion`, `consentRejectMarker`: the respondents whose answer to the consent
  question contains the marker are left out. Use `""` to disable the check.
- Two respondents with exactly the same answers are counted once.
- `ordinalRanking`: the default is a list of German frequency adverbs, from `immer`
  (12) down to `weiß nicht` (0).
- `questionTransforms`: `firstWord` keeps the part of each answer before the first
  space (`16 Jahre` becomes `16`). The default applies it to question `25`.

*/
