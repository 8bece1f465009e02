//! The expense form shared by the add and edit pages.

use maud::{Markup, html};

use crate::{
    category::Category,
    html::{FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, loading_spinner},
    validation::{DESCRIPTION_MAX_LENGTH, ExpenseErrors},
};

/// The raw field values used to fill in the expense form.
///
/// Kept as strings so a rejected submission can be echoed back exactly as the
/// user typed it.
#[derive(Debug, Default, Clone)]
pub struct ExpenseFormValues {
    pub amount: String,
    pub category: String,
    pub description: String,
    pub date: String,
}

fn field_error(error_message: Option<&str>) -> Markup {
    html! {
        @if let Some(error_message) = error_message
        {
            p class="text-red-500 text-base" { (error_message) }
        }
    }
}

/// Render the expense form posting to `action`.
pub fn expense_form(
    action: &str,
    submit_label: &str,
    values: &ExpenseFormValues,
    errors: &ExpenseErrors,
) -> Markup {
    html! {
        form
            hx-post=(action)
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6 w-full max-w-md"
        {
            div
            {
                label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                div class="input-wrapper w-full"
                {
                    input
                        type="number"
                        name="amount"
                        id="amount"
                        class=(FORM_TEXT_INPUT_STYLE)
                        required
                        min="0.01"
                        step="0.01"
                        value=(values.amount);
                }

                (field_error(errors.amount_error.as_deref()))
            }

            div
            {
                label for="category" class=(FORM_LABEL_STYLE) { "Category" }

                select
                    name="category"
                    id="category"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                {
                    @for category in Category::ALL
                    {
                        option
                            value=(category.as_str())
                            selected[values.category == category.as_str()]
                        {
                            (category.label())
                        }
                    }
                }

                (field_error(errors.category_error.as_deref()))
            }

            div
            {
                label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                input
                    type="text"
                    name="description"
                    id="description"
                    class=(FORM_TEXT_INPUT_STYLE)
                    maxlength=(DESCRIPTION_MAX_LENGTH)
                    value=(values.description);

                (field_error(errors.description_error.as_deref()))
            }

            div
            {
                label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                input
                    type="date"
                    name="date"
                    id="date"
                    class=(FORM_TEXT_INPUT_STYLE)
                    required
                    value=(values.date);

                (field_error(errors.date_error.as_deref()))
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                (submit_label)
            }
        }
    }
}
