use std::rc::Rc;

use bindery_reactive::WatcherId;

use crate::{
    document::Document,
    error::Error,
    template::Template,
    vm::Vm,
};

/// Installs the render watcher and runs it once under tracking.
///
/// That first run renders the template and, through the property reads it
/// makes, subscribes the watcher to every property the template uses. The
/// active slot is back to its previous state when this returns.
pub(crate) fn mount(vm: &Vm, document: &dyn Document) -> Result<WatcherId, Error> {
    let update = compile(vm, document)?;
    let runtime = vm.runtime();
    let watcher = runtime.create_watcher(update);
    vm.inner.render_watcher.set(Some(watcher));

    runtime.run_tracked(watcher);

    tracing::debug!(el = vm.selector(), ?watcher, "mounted");
    Ok(watcher)
}

/// Looks up the render surface, captures its text as the template and
/// returns the update function re-rendering it.
fn compile(vm: &Vm, document: &dyn Document) -> Result<Box<dyn Fn()>, Error> {
    let el = document
        .query_selector(vm.selector())
        .ok_or_else(|| Error::RenderSurfaceNotFound {
            selector: vm.selector().to_string(),
        })?;
    *vm.inner.surface.borrow_mut() = Some(el.clone());

    let template = Template::new(el.text());
    let vm = Rc::downgrade(&vm.inner);

    Ok(Box::new(move || {
        let Some(inner) = vm.upgrade() else {
            return;
        };
        let vm = Vm { inner };
        let text = template.render(|name| vm.interpolate(name));
        tracing::debug!(el = vm.selector(), "render");
        el.set_text(text);
    }))
}
