//! Browser binding: reads the form from the page and renders into `#result`.

use std::rc::Rc;

use log::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlInputElement};

use crate::controller::{FormSource, PredictorController, ResultView};
use crate::models::{Field, FormInputs, COMPUTE_RATIOS_ID};
use crate::render::{RenderedPrediction, PREDICTION_LABEL};
use crate::service::HttpPredictionService;

pub const RESULT_ID: &str = "result";
pub const TRIGGER_ID: &str = "predictBtn";

pub struct DomForm {
    document: Document,
}

impl DomForm {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    fn input(&self, id: &str) -> Option<HtmlInputElement> {
        self.document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    }
}

impl FormSource for DomForm {
    fn read(&self) -> FormInputs {
        let mut inputs = FormInputs::default();
        for field in Field::ALL {
            match self.input(field.id()) {
                Some(input) => inputs.set(field, input.value()),
                None => warn!("form field #{} is missing", field.id()),
            }
        }
        inputs.compute_ratios = self.input(COMPUTE_RATIOS_ID).is_some_and(|i| i.checked());
        inputs
    }
}

pub struct DomResultView {
    document: Document,
    region: HtmlElement,
}

impl DomResultView {
    pub fn new(document: Document, region: HtmlElement) -> Self {
        Self { document, region }
    }

    fn write_prediction(&self, rendered: &RenderedPrediction) -> Result<(), JsValue> {
        self.region.set_text_content(None);
        let label = self.document.create_element("b")?;
        label.set_text_content(Some(PREDICTION_LABEL));
        self.region.append_child(&label)?;
        // prediction text is inserted as a text node, never parsed as markup
        let body = self.document.create_text_node(&format!(" {}", rendered.body()));
        self.region.append_child(&body)?;
        Ok(())
    }
}

impl ResultView for DomResultView {
    fn show_pending(&self, placeholder: &str) {
        if let Err(err) = self.region.style().set_property("display", "block") {
            warn!("could not reveal #{}: {:?}", RESULT_ID, err);
        }
        self.region.set_text_content(Some(placeholder));
    }

    fn show_prediction(&self, rendered: &RenderedPrediction) {
        if let Err(err) = self.write_prediction(rendered) {
            warn!("could not render prediction: {:?}", err);
            self.region.set_text_content(Some(&rendered.to_string()));
        }
    }

    fn show_error(&self, message: &str) {
        self.region.set_text_content(Some(message));
    }
}

type DomController = PredictorController<DomForm, HttpPredictionService, DomResultView>;

fn attach(document: &Document) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let origin = window.location().origin()?;
    let service =
        HttpPredictionService::new(&origin).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let region = document
        .get_element_by_id(RESULT_ID)
        .ok_or_else(|| JsValue::from_str("missing #result"))?
        .dyn_into::<HtmlElement>()
        .map_err(JsValue::from)?;
    let trigger = document
        .get_element_by_id(TRIGGER_ID)
        .ok_or_else(|| JsValue::from_str("missing #predictBtn"))?;

    let controller: Rc<DomController> = Rc::new(PredictorController::new(
        DomForm::new(document.clone()),
        service,
        DomResultView::new(document.clone(), region),
    ));

    let on_click = Closure::<dyn FnMut()>::new(move || {
        let payload = controller.begin();
        let controller = Rc::clone(&controller);
        wasm_bindgen_futures::spawn_local(async move {
            // the view already shows the outcome
            let _ = controller.complete(payload).await;
        });
    });
    trigger.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

/// Wires the click handler once the document has been parsed.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    if document.ready_state() != "loading" {
        return attach(&document);
    }

    let ready_doc = document.clone();
    let on_ready = Closure::<dyn FnMut()>::new(move || {
        if let Err(err) = attach(&ready_doc) {
            warn!("predictor not attached: {:?}", err);
        }
    });
    document.add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
    on_ready.forget();
    Ok(())
}
