// Drawing of the diverging stacked bar charts.

use std::error::Error;

use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, TextStyle};

use crate::survey::*;

const FONT: &str = "sans-serif";

/// Draws the chart as an SVG file.
pub fn render_chart(chart: &ChartData, path: &Path, size: (u32, u32)) -> SurveyResult<()> {
    debug!("render_chart: {:?} -> {:?}", chart.x_question, path);
    draw_chart(chart, path, size).map_err(|e| SurveyError::RenderingChart {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    info!("Saved as {}", path.display());
    Ok(())
}

// The bars of one x-value are stacked vertically (one per y-bin), each centred
// on the position of the x-value.
fn draw_chart(chart: &ChartData, path: &Path, size: (u32, u32)) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let step: f64 = match chart.xs.as_slice() {
        [first, second, ..] => second.position - first.position,
        _ => chart
            .cells
            .iter()
            .map(|c| c.width)
            .fold(1.0, f64::max),
    };
    let x_min = chart.xs.first().map(|x| x.position).unwrap_or(0.0) - step / 2.0;
    let x_max = chart.xs.last().map(|x| x.position).unwrap_or(0.0) + step / 2.0;
    let y_max = chart.ys.len().max(1) as f64 - 0.5;

    let mut ctx = ChartBuilder::on(&root)
        .margin(20)
        .caption(
            format!("{} / {}", chart.x_question, chart.y_question),
            (FONT, 16),
        )
        .set_label_area_size(LabelAreaPosition::Left, 220)
        .set_label_area_size(LabelAreaPosition::Bottom, 70)
        .build_cartesian_2d(x_min..x_max, -0.5..y_max)?;

    ctx.configure_mesh()
        .disable_mesh()
        .x_labels(0)
        .y_labels(0)
        .x_desc(chart.x_question.as_str())
        .y_desc(chart.y_question.as_str())
        .axis_desc_style((FONT, 14))
        .draw()?;

    let bins: HashMap<&str, f64> = chart
        .ys
        .iter()
        .map(|y| (y.label.as_str(), y.bin as f64))
        .collect();

    for (idx, xe) in chart.xs.iter().enumerate() {
        let color = Palette99::pick(idx).mix(0.8);
        let cells: Vec<&ChartCell> = chart.cells.iter().filter(|c| c.x == xe.label).collect();
        ctx.draw_series(cells.iter().filter_map(|c| {
            bins.get(c.y.as_str()).map(|bin| {
                Rectangle::new(
                    [
                        (xe.position - 0.5 * c.width, bin - 0.5),
                        (xe.position + 0.5 * c.width, bin + 0.5),
                    ],
                    color.filled(),
                )
            })
        }))?;
        let label_style = TextStyle::from((FONT, 12).into_font().style(FontStyle::Bold))
            .pos(Pos::new(HPos::Center, VPos::Center));
        ctx.draw_series(cells.iter().filter_map(|c| {
            bins.get(c.y.as_str())
                .map(|bin| Text::new(c.label.clone(), (xe.position, *bin), label_style.clone()))
        }))?;
    }

    // Tick labels: the values of the axes, drawn in pixel coordinates.
    let x_style = TextStyle::from((FONT, 13).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
    for xe in chart.xs.iter() {
        let (px, py) = ctx.backend_coord(&(xe.position, -0.5));
        root.draw(&Text::new(xe.label.clone(), (px, py + 8), x_style.clone()))?;
    }
    let y_style = TextStyle::from((FONT, 13).into_font()).pos(Pos::new(HPos::Right, VPos::Center));
    for ye in chart.ys.iter() {
        let (px, py) = ctx.backend_coord(&(x_min, ye.bin as f64));
        root.draw(&Text::new(ye.label.clone(), (px - 8, py), y_style.clone()))?;
    }

    root.present()?;
    Ok(())
}
